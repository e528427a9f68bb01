use crate::api::ApiError;
use crate::auth::extractors::{AppState, AuthenticatedUser};
use crate::models::{build_folder_tree, Folder, FolderNode};
use crate::repositories::folder_repository::FolderRepository;
use anyhow::Result;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFolderRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RenameFolderRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

pub async fn create_router() -> Result<Router<AppState>> {
    let router = Router::new()
        .route("/", get(list_folders).post(create_folder))
        .route("/{id}", get(get_folder).put(rename_folder).delete(delete_folder));

    Ok(router)
}

/// The caller's folders as a nested tree for the sidebar.
async fn list_folders(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> Result<Json<Vec<FolderNode>>, ApiError> {
    let repo = FolderRepository::new(app_state.database.pool().clone());
    let folders = repo
        .list_for_owner(auth_user.user.id)
        .await
        .map_err(ApiError::db)?;

    Ok(Json(build_folder_tree(folders)))
}

async fn get_folder(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Folder>, ApiError> {
    let repo = FolderRepository::new(app_state.database.pool().clone());
    let folder = fetch_owned(&repo, id, &auth_user).await?;

    Ok(Json(folder))
}

/// Folders are private to their owner; someone else's folder reads as missing.
async fn fetch_owned(
    repo: &FolderRepository,
    id: Uuid,
    auth_user: &AuthenticatedUser,
) -> Result<Folder, ApiError> {
    let folder = repo
        .get(id)
        .await
        .map_err(ApiError::db)?
        .ok_or(ApiError::NotFound)?;

    if folder.owner_id != auth_user.user.id {
        return Err(ApiError::NotFound);
    }

    Ok(folder)
}

async fn create_folder(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(req): Json<CreateFolderRequest>,
) -> Result<Json<Folder>, ApiError> {
    if !auth_user.user.role.can_write() {
        return Err(ApiError::Forbidden("Viewers may not create folders".to_string()));
    }
    req.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let repo = FolderRepository::new(app_state.database.pool().clone());

    if let Some(parent_id) = req.parent_id {
        // Parent must exist and belong to the caller.
        fetch_owned(&repo, parent_id, &auth_user).await?;
    }

    let folder = Folder {
        id: Uuid::new_v4(),
        name: req.name,
        parent_id: req.parent_id,
        owner_id: auth_user.user.id,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };

    let created = repo.create(&folder).await.map_err(ApiError::db)?;

    Ok(Json(created))
}

async fn rename_folder(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RenameFolderRequest>,
) -> Result<Json<Folder>, ApiError> {
    req.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let repo = FolderRepository::new(app_state.database.pool().clone());
    fetch_owned(&repo, id, &auth_user).await?;

    let renamed = repo.rename(id, &req.name).await.map_err(ApiError::db)?;

    Ok(Json(renamed))
}

async fn delete_folder(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let repo = FolderRepository::new(app_state.database.pool().clone());
    fetch_owned(&repo, id, &auth_user).await?;

    repo.delete(id).await.map_err(ApiError::db)?;

    Ok(Json(serde_json::json!({ "deleted": id })))
}
