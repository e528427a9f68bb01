use crate::api::ApiError;
use crate::auth::extractors::{AppState, AuthenticatedUser};
use crate::models::Course;
use crate::repositories::course_repository::CourseRepository;
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
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 20))]
    pub code: Option<String>,
    /// Display color, e.g. "#4f46e5".
    #[validate(length(min = 4, max = 20))]
    pub color: String,
}

pub async fn create_router() -> Result<Router<AppState>> {
    let router = Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/{id}", get(get_course).delete(delete_course));

    Ok(router)
}

async fn list_courses(
    State(app_state): State<AppState>,
    _auth_user: AuthenticatedUser,
) -> Result<Json<Vec<Course>>, ApiError> {
    let repo = CourseRepository::new(app_state.database.pool().clone());
    let courses = repo.list().await.map_err(ApiError::db)?;

    Ok(Json(courses))
}

async fn get_course(
    State(app_state): State<AppState>,
    _auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Course>, ApiError> {
    let repo = CourseRepository::new(app_state.database.pool().clone());
    let course = repo
        .get(id)
        .await
        .map_err(ApiError::db)?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(course))
}

async fn create_course(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(req): Json<CreateCourseRequest>,
) -> Result<Json<Course>, ApiError> {
    if !auth_user.user.role.can_write() {
        return Err(ApiError::Forbidden("Viewers may not create courses".to_string()));
    }
    req.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let course = Course {
        id: Uuid::new_v4(),
        name: req.name,
        code: req.code,
        color: req.color,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };

    let repo = CourseRepository::new(app_state.database.pool().clone());
    let created = repo.create(&course).await.map_err(ApiError::db)?;

    Ok(Json(created))
}

async fn delete_course(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !auth_user.user.role.can_write() {
        return Err(ApiError::Forbidden("Viewers may not delete courses".to_string()));
    }

    let repo = CourseRepository::new(app_state.database.pool().clone());
    repo.get(id)
        .await
        .map_err(ApiError::db)?
        .ok_or(ApiError::NotFound)?;
    repo.delete(id).await.map_err(ApiError::db)?;

    Ok(Json(serde_json::json!({ "deleted": id })))
}
