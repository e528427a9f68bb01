pub mod auth;
pub mod courses;
pub mod favorites;
pub mod folders;
pub mod resources;
pub mod stats;

use crate::auth::extractors::AppState;
use anyhow::Result;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use thiserror::Error;

pub async fn create_router() -> Result<Router<AppState>> {
    let router = Router::new()
        .route("/status", get(status_handler))
        .nest("/auth", auth::create_router().await?)
        .nest("/resources", resources::create_router().await?)
        .nest("/courses", courses::create_router().await?)
        .nest("/folders", folders::create_router().await?)
        .nest("/favorites", favorites::create_router().await?)
        .nest("/stats", stats::create_router().await?);

    Ok(router)
}

async fn status_handler() -> &'static str {
    "API is running"
}

/// Errors surfaced by the library endpoints, mapped to HTTP status codes.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Upload too large")]
    PayloadTooLarge,
    #[error("Database error: {0}")]
    Database(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn db(err: impl std::fmt::Display) -> Self {
        ApiError::Database(err.to_string())
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Upload too large".to_string())
            }
            ApiError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ApiError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
