use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{
    config::ConfigError,
    search::{SearchError, StoreError},
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Query parameter q is required")]
    MissingQuery,

    #[error("Internal error: {0}")]
    Internal(#[from] StoreError),
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::EmptyTerm => AppError::MissingQuery,
            SearchError::Store(err) => AppError::Internal(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::MissingQuery => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Internal(err) => {
                error!("Search failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
