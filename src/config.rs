//! Runtime configuration
//!
//! Everything is read from environment variables once at startup.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub postcode_api_url: String,
    pub http_timeout: Duration,
    pub openai_api_key: Option<String>,
    pub openai_api_url: String,
    pub openai_model: String,
    pub suggestion_count: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup, so tests need not touch the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("BASKET_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        Ok(Self {
            database_path,
            bind_address: lookup("BASKET_BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "BASKET_PORT", 8000)?,
            postcode_api_url: lookup("BASKET_POSTCODE_API_URL")
                .unwrap_or_else(|| "https://api.postcodes.io".to_string()),
            http_timeout: Duration::from_secs(parse_or(&lookup, "BASKET_HTTP_TIMEOUT_SECS", 10)?),
            openai_api_key: lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty()),
            openai_api_url: lookup("BASKET_OPENAI_API_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string()),
            openai_model: lookup("BASKET_OPENAI_MODEL")
                .unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            suggestion_count: parse_or(&lookup, "BASKET_SUGGESTION_COUNT", 3)?,
        })
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value,
            reason: e.to_string(),
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

/// `<project>/data/basket.db`, found by walking up from target/{debug,release}
fn default_database_path() -> PathBuf {
    let mut path = env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("basket.db");
    path
}
