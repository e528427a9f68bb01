use crate::api::ApiError;
use crate::auth::extractors::{AppState, AuthenticatedUser};
use crate::repositories::resource_repository::{ResourceRepository, StorageStats};
use crate::services::classifier::format_file_size;
use anyhow::Result;
use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: StorageStats,
    /// Pre-formatted total for display, e.g. "1.46 KB".
    pub total_size_display: String,
}

pub async fn create_router() -> Result<Router<AppState>> {
    let router = Router::new().route("/", get(get_stats));

    Ok(router)
}

async fn get_stats(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> Result<Json<StatsResponse>, ApiError> {
    let repo = ResourceRepository::new(app_state.database.pool().clone());
    let stats = repo
        .get_storage_stats(auth_user.user.id)
        .await
        .map_err(ApiError::db)?;

    let total_size_display = format_file_size(stats.total_size.max(0) as u64);

    Ok(Json(StatsResponse {
        stats,
        total_size_display,
    }))
}
