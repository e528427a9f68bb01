use crate::api::ApiError;
use crate::auth::extractors::{AppState, AuthenticatedUser};
use crate::repositories::favorite_repository::FavoriteRepository;
use crate::repositories::resource_repository::ResourceRepository;
use anyhow::Result;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub resource_id: Uuid,
    pub favorited: bool,
}

pub async fn create_router() -> Result<Router<AppState>> {
    let router = Router::new()
        .route("/", get(list_favorites))
        .route("/{resource_id}/toggle", post(toggle_favorite));

    Ok(router)
}

/// Resource ids the caller has bookmarked.
async fn list_favorites(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> Result<Json<Vec<Uuid>>, ApiError> {
    let repo = FavoriteRepository::new(app_state.database.pool().clone());
    let ids = repo
        .list_resource_ids(auth_user.user.id)
        .await
        .map_err(ApiError::db)?;

    Ok(Json(ids))
}

/// Flips the caller's bookmark on a resource. Toggling twice restores the
/// original state.
async fn toggle_favorite(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(resource_id): Path<Uuid>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let resources = ResourceRepository::new(app_state.database.pool().clone());
    resources
        .get(resource_id)
        .await
        .map_err(ApiError::db)?
        .ok_or(ApiError::NotFound)?;

    let repo = FavoriteRepository::new(app_state.database.pool().clone());
    let favorited = repo
        .toggle(auth_user.user.id, resource_id)
        .await
        .map_err(ApiError::db)?;

    Ok(Json(ToggleResponse {
        resource_id,
        favorited,
    }))
}
