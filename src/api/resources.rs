use crate::api::ApiError;
use crate::auth::extractors::{AppState, AuthenticatedUser};
use crate::models::{Resource, ResourceType, ResourceWithRefs, UserRole, Visibility};
use crate::repositories::resource_repository::{
    FolderScope, ResourceFilter, ResourceRepository, ResourceUpdate, SortOption,
};
use crate::services::classifier;
use anyhow::Result;
use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ResourceListParams {
    pub search: Option<String>,
    /// Category name or "all".
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    /// Course id or "all".
    pub course_id: Option<String>,
    pub sort_by: Option<SortOption>,
    /// Folder id, or "root" for folderless resources; absent means unscoped.
    pub folder_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CounterResponse {
    pub id: Uuid,
    pub count: i64,
}

pub async fn create_router() -> Result<Router<AppState>> {
    let router = Router::new()
        .route("/", get(list_resources).post(upload_resource))
        .route("/{id}", get(get_resource).put(update_resource).delete(delete_resource))
        .route("/{id}/download", get(download_resource))
        .route("/{id}/view", post(record_view));

    Ok(router)
}

fn parse_filter(viewer_id: Uuid, params: ResourceListParams) -> Result<ResourceFilter, ApiError> {
    let mut filter = ResourceFilter::for_viewer(viewer_id);
    filter.search = params.search;
    filter.sort = params.sort_by.unwrap_or_default();

    if let Some(type_param) = params.resource_type.as_deref() {
        if type_param != "all" {
            let resource_type: ResourceType =
                type_param.parse().map_err(ApiError::BadRequest)?;
            filter.resource_type = Some(resource_type);
        }
    }

    if let Some(course_param) = params.course_id.as_deref() {
        if course_param != "all" {
            let course_id = Uuid::parse_str(course_param)
                .map_err(|_| ApiError::BadRequest("Invalid course id".to_string()))?;
            filter.course_id = Some(course_id);
        }
    }

    if let Some(folder_param) = params.folder_id.as_deref() {
        filter.folder = match folder_param {
            "root" | "null" => FolderScope::Root,
            id => FolderScope::In(
                Uuid::parse_str(id)
                    .map_err(|_| ApiError::BadRequest("Invalid folder id".to_string()))?,
            ),
        };
    }

    Ok(filter)
}

async fn list_resources(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
    Query(params): Query<ResourceListParams>,
) -> Result<Json<Vec<ResourceWithRefs>>, ApiError> {
    let filter = parse_filter(auth_user.user.id, params)?;
    let repo = ResourceRepository::new(app_state.database.pool().clone());
    let resources = repo.list(&filter).await.map_err(ApiError::db)?;

    Ok(Json(resources))
}

async fn get_resource(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Resource>, ApiError> {
    let repo = ResourceRepository::new(app_state.database.pool().clone());
    let resource = fetch_visible(&repo, id, &auth_user).await?;

    Ok(Json(resource))
}

/// Loads a resource the caller is allowed to see: their own rows, anything
/// non-private, or everything for admins. Hidden rows read as missing.
async fn fetch_visible(
    repo: &ResourceRepository,
    id: Uuid,
    auth_user: &AuthenticatedUser,
) -> Result<Resource, ApiError> {
    let resource = repo
        .get(id)
        .await
        .map_err(ApiError::db)?
        .ok_or(ApiError::NotFound)?;

    let visible = resource.owner_id == auth_user.user.id
        || resource.visibility != Visibility::Private
        || auth_user.user.role == UserRole::Admin;
    if !visible {
        return Err(ApiError::NotFound);
    }

    Ok(resource)
}

fn require_owner_or_admin(resource: &Resource, auth_user: &AuthenticatedUser) -> Result<(), ApiError> {
    if resource.owner_id != auth_user.user.id && auth_user.user.role != UserRole::Admin {
        return Err(ApiError::Forbidden(
            "Only the owner or an admin may modify a resource".to_string(),
        ));
    }
    Ok(())
}

// Matches the column width so an oversized title is a 400, not a database error.
const MAX_TITLE_LENGTH: usize = 512;

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Title exceeds {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

async fn upload_resource(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<Json<Resource>, ApiError> {
    if !auth_user.user.role.can_write() {
        return Err(ApiError::Forbidden("Viewers may not upload".to_string()));
    }

    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut course_id: Option<Uuid> = None;
    let mut folder_id: Option<Uuid> = None;
    let mut tags: Vec<String> = Vec::new();
    let mut semester: Option<String> = None;
    let mut year: Option<String> = None;
    let mut visibility = Visibility::Private;
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = Some(read_text(field).await?),
            "description" => description = Some(read_text(field).await?),
            "course_id" => {
                course_id = Some(
                    Uuid::parse_str(&read_text(field).await?)
                        .map_err(|_| ApiError::BadRequest("Invalid course id".to_string()))?,
                )
            }
            "folder_id" => {
                folder_id = Some(
                    Uuid::parse_str(&read_text(field).await?)
                        .map_err(|_| ApiError::BadRequest("Invalid folder id".to_string()))?,
                )
            }
            "tags" => {
                tags = read_text(field)
                    .await?
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            }
            "semester" => semester = Some(read_text(field).await?),
            "year" => year = Some(read_text(field).await?),
            "visibility" => {
                visibility = read_text(field)
                    .await?
                    .parse()
                    .map_err(ApiError::BadRequest)?
            }
            "file" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::BadRequest("File part needs a filename".to_string()))?;
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
                if bytes.len() > app_state.config.storage.max_upload_bytes {
                    return Err(ApiError::PayloadTooLarge);
                }
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            other => {
                warn!("Ignoring unknown upload field: {}", other);
            }
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("Missing file part".to_string()))?;

    let title = title.unwrap_or_else(|| file_stem(&file_name));
    validate_title(&title)?;

    let mime_type = classifier::resolve_mime_type(content_type.as_deref(), &file_name);
    let resource_type = classifier::classify(&mime_type, &file_name);

    let stored = app_state
        .storage
        .store(&file_name, &bytes)
        .await
        .map_err(ApiError::storage)?;

    let resource = Resource {
        id: Uuid::new_v4(),
        title,
        file_key: stored.file_key,
        folder_id,
        course_id,
        owner_id: auth_user.user.id,
        resource_type,
        mime_type,
        size: stored.size,
        checksum: Some(stored.checksum),
        tags,
        description,
        semester,
        year,
        visibility,
        download_count: 0,
        view_count: 0,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };

    let repo = ResourceRepository::new(app_state.database.pool().clone());
    let created = match repo.create(&resource).await {
        Ok(created) => created,
        Err(e) => {
            // Roll the stored object back so a failed insert leaves no orphan.
            if let Err(cleanup) = app_state.storage.delete(&resource.file_key).await {
                warn!("Failed to clean up object {}: {}", resource.file_key, cleanup);
            }
            return Err(ApiError::db(e));
        }
    };

    info!(
        "Uploaded resource {} ({}, {} bytes) for user {}",
        created.id, created.resource_type, created.size, auth_user.user.email
    );

    Ok(Json(created))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed field: {}", e)))
}

fn file_stem(file_name: &str) -> String {
    std::path::Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}

async fn update_resource(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(update): Json<ResourceUpdate>,
) -> Result<Json<Resource>, ApiError> {
    if let Some(title) = update.title.as_deref() {
        validate_title(title)?;
    }

    let repo = ResourceRepository::new(app_state.database.pool().clone());
    let resource = fetch_visible(&repo, id, &auth_user).await?;
    require_owner_or_admin(&resource, &auth_user)?;

    let updated = repo.update(id, update).await.map_err(ApiError::db)?;

    Ok(Json(updated))
}

async fn delete_resource(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let repo = ResourceRepository::new(app_state.database.pool().clone());
    let resource = fetch_visible(&repo, id, &auth_user).await?;
    require_owner_or_admin(&resource, &auth_user)?;

    repo.delete(id).await.map_err(ApiError::db)?;

    if let Err(e) = app_state.storage.delete(&resource.file_key).await {
        warn!("Failed to delete object {}: {}", resource.file_key, e);
    }

    info!("Deleted resource {} ({})", id, resource.title);

    Ok(Json(serde_json::json!({ "deleted": id })))
}

async fn download_resource(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let repo = ResourceRepository::new(app_state.database.pool().clone());
    let resource = fetch_visible(&repo, id, &auth_user).await?;

    let file = app_state
        .storage
        .open(&resource.file_key)
        .await
        .map_err(ApiError::storage)?;

    repo.increment_download_count(id)
        .await
        .map_err(ApiError::db)?;

    let body = Body::from_stream(ReaderStream::new(file));
    let response = Response::builder()
        .header(header::CONTENT_TYPE, resource.mime_type.as_str())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download_name(&resource)),
        )
        .header(header::CONTENT_LENGTH, resource.size)
        .body(body)
        .map_err(|e| ApiError::Storage(e.to_string()))?;

    Ok(response)
}

/// Filename offered to the client: the title plus the stored extension,
/// stripped of characters that would break the header.
fn download_name(resource: &Resource) -> String {
    let safe_title: String = resource
        .title
        .chars()
        .map(|c| match c {
            '"' | '\\' | '\r' | '\n' => '_',
            c => c,
        })
        .collect();
    match std::path::Path::new(&resource.file_key)
        .extension()
        .and_then(|e| e.to_str())
    {
        Some(ext) => format!("{}.{}", safe_title, ext),
        None => safe_title,
    }
}

async fn record_view(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CounterResponse>, ApiError> {
    let repo = ResourceRepository::new(app_state.database.pool().clone());
    fetch_visible(&repo, id, &auth_user).await?;

    let count = repo.increment_view_count(id).await.map_err(ApiError::db)?;

    Ok(Json(CounterResponse { id, count }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ResourceListParams {
        ResourceListParams {
            search: None,
            resource_type: None,
            course_id: None,
            sort_by: None,
            folder_id: None,
        }
    }

    #[test]
    fn all_sentinels_clear_filters() {
        let mut p = params();
        p.resource_type = Some("all".to_string());
        p.course_id = Some("all".to_string());
        let filter = parse_filter(Uuid::new_v4(), p).unwrap();
        assert!(filter.resource_type.is_none());
        assert!(filter.course_id.is_none());
        assert_eq!(filter.folder, FolderScope::Any);
    }

    #[test]
    fn folder_root_sentinel_scopes_to_folderless() {
        let mut p = params();
        p.folder_id = Some("root".to_string());
        let filter = parse_filter(Uuid::new_v4(), p).unwrap();
        assert_eq!(filter.folder, FolderScope::Root);
    }

    #[test]
    fn invalid_type_is_rejected() {
        let mut p = params();
        p.resource_type = Some("spreadsheet".to_string());
        assert!(parse_filter(Uuid::new_v4(), p).is_err());
    }

    #[test]
    fn title_validation_bounds() {
        assert!(validate_title("Lecture 1").is_ok());
        assert!(validate_title(&"x".repeat(512)).is_ok());
        assert!(validate_title(&"x".repeat(513)).is_err());
        assert!(validate_title("   ").is_err());
    }

    #[test]
    fn download_name_keeps_extension_and_sanitizes() {
        let mut resource = Resource {
            id: Uuid::new_v4(),
            title: "Weekly \"notes\"".to_string(),
            file_key: "abc.pdf".to_string(),
            folder_id: None,
            course_id: None,
            owner_id: Uuid::new_v4(),
            resource_type: ResourceType::Pdf,
            mime_type: "application/pdf".to_string(),
            size: 1,
            checksum: None,
            tags: vec![],
            description: None,
            semester: None,
            year: None,
            visibility: Visibility::Private,
            download_count: 0,
            view_count: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        assert_eq!(download_name(&resource), "Weekly _notes_.pdf");

        resource.file_key = "abc".to_string();
        assert_eq!(download_name(&resource), "Weekly _notes_");
    }
}
