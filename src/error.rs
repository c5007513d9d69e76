//! Application error taxonomy
//!
//! One error type for every operation. HTTP handlers turn it into a JSON
//! `{"error": ...}` body, MCP tools into a tool error.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Recipe not found with id: {0}")]
    UnknownRecipe(i64),

    #[error("No recipes selected")]
    EmptySelection,

    #[error("No store stocks every ingredient on the shopping list")]
    NoComparableStore,

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("{0}")]
    ValidationFailure(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for application operations
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownRecipe(_) => StatusCode::NOT_FOUND,
            Self::EmptySelection | Self::ValidationFailure(_) => StatusCode::BAD_REQUEST,
            Self::NoComparableStore => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NetworkFailure(_) => StatusCode::BAD_GATEWAY,
            Self::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to a client
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(DbError::Sqlite(e))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        Self::NetworkFailure(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::ValidationFailure(format!("Malformed request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
