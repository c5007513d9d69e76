//! Shared application context
//!
//! Handed to every HTTP handler and to the MCP service instead of living in
//! globals.

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::db::Database;
use crate::error::AppResult;
use crate::services::{Geocoder, OpenAiGenerator, PostcodesIo, RecipeGenerator};
use crate::tools::status::StatusTracker;

#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub geocoder: Arc<dyn Geocoder>,
    /// None when no generator is configured
    pub generator: Option<Arc<dyn RecipeGenerator>>,
    pub suggestion_count: usize,
    pub status: Arc<StatusTracker>,
}

impl AppState {
    pub fn new(
        database: Database,
        geocoder: Arc<dyn Geocoder>,
        generator: Option<Arc<dyn RecipeGenerator>>,
        suggestion_count: usize,
    ) -> Self {
        Self {
            database,
            geocoder,
            generator,
            suggestion_count,
            status: Arc::new(StatusTracker::new(None)),
        }
    }

    /// Report the on-disk database in status output
    pub fn with_database_path(mut self, path: std::path::PathBuf) -> Self {
        self.status = Arc::new(StatusTracker::new(Some(path)));
        self
    }

    /// Open the database and build the real collaborators from config
    pub fn from_config(config: &Config) -> AppResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");
        let database = Database::open(&config.database_path)?;

        let geocoder = PostcodesIo::new(config.postcode_api_url.clone(), config.http_timeout)?;

        let generator = OpenAiGenerator::from_config(config)?
            .map(|g| Arc::new(g) as Arc<dyn RecipeGenerator>);
        if generator.is_none() {
            info!("OPENAI_API_KEY not set, recipe generation disabled");
        }

        Ok(Self::new(
            database,
            Arc::new(geocoder),
            generator,
            config.suggestion_count,
        )
        .with_database_path(config.database_path.clone()))
    }
}
