//! Basket Status Tool
//!
//! Provides runtime status information about the Basket service.

use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;

use crate::build_info::BuildInfo;
use crate::db::{migrations, Database};
use crate::error::AppResult;
use crate::models::{Recipe, Store};

/// Runtime status of the Basket service
#[derive(Debug, Clone, Serialize)]
pub struct BasketStatus {
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    pub database_path: Option<String>,
    pub database_size_bytes: Option<u64>,
    pub schema_version: i32,
    pub recipe_count: i64,
    pub store_count: i64,

    pub recipe_generation_enabled: bool,
    pub uptime_seconds: u64,
    pub process_id: u32,
}

/// Status tracker for collecting runtime information
#[derive(Debug)]
pub struct StatusTracker {
    start_time: Instant,
    database_path: Option<PathBuf>,
}

impl StatusTracker {
    pub fn new(database_path: Option<PathBuf>) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    pub fn get_status(&self, db: &Database, generator_enabled: bool) -> AppResult<BasketStatus> {
        let build_info = BuildInfo::current();

        let database_size_bytes = self
            .database_path
            .as_ref()
            .and_then(|path| std::fs::metadata(path).ok())
            .map(|m| m.len());

        let (schema_version, recipe_count, store_count) = db.with_conn(|conn| {
            Ok((
                migrations::get_schema_version(conn)?,
                Recipe::count(conn)?,
                Store::count(conn)?,
            ))
        })?;

        Ok(BasketStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.as_ref().map(|p| p.display().to_string()),
            database_size_bytes,
            schema_version,
            recipe_count,
            store_count,
            recipe_generation_enabled: generator_enabled,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: std::process::id(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::temp_database;

    #[test]
    fn test_status_counts() {
        let (dir, db) = temp_database();
        let tracker = StatusTracker::new(Some(dir.path().join("basket.db")));

        let status = tracker.get_status(&db, false).unwrap();
        assert_eq!(status.schema_version, 1);
        assert_eq!(status.recipe_count, 0);
        assert_eq!(status.store_count, 0);
        assert!(status.database_size_bytes.is_some());
        assert!(!status.recipe_generation_enabled);
    }
}
