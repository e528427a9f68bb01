use anyhow::Result;
use axum::{
    extract::State,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{extractors::AppState, AdminUser, AuthError, AuthenticatedUser};
use crate::models::user::{User, UserRole};
use crate::repositories::user_repository::UserRepository;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
    /// Absent keeps the current avatar; explicit null clears it.
    #[validate(url)]
    #[serde(default, with = "serde_with::rust::double_option")]
    pub avatar_url: Option<Option<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub active: bool,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            role: user.role,
            active: user.active,
        }
    }
}

pub async fn create_router() -> Result<Router<AppState>> {
    let router = Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/profile", get(get_profile))
        .route("/profile", put(update_profile))
        .route("/users", get(list_users));

    Ok(router)
}

async fn login(
    State(app_state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    req.validate().map_err(|_| AuthError::InvalidCredentials)?;

    let user_repo = UserRepository::new(app_state.database.pool().clone());

    let user = user_repo
        .find_by_email(&req.email)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::InvalidCredentials)?;

    if !user.active {
        return Err(AuthError::UserInactive);
    }

    let is_valid = verify_password(&req.password, &user.password_hash)
        .map_err(|_| AuthError::InvalidCredentials)?;

    if !is_valid {
        return Err(AuthError::InvalidCredentials);
    }

    let token = app_state
        .jwt_service
        .create_token_for_user(user.id, user.email.clone(), user.role.to_string())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(Json(AuthResponse {
        token,
        user: UserInfo::from(user),
    }))
}

async fn register(
    State(app_state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    req.validate().map_err(|_| AuthError::InvalidCredentials)?;

    let user_repo = UserRepository::new(app_state.database.pool().clone());

    if user_repo
        .find_by_email(&req.email)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .is_some()
    {
        return Err(AuthError::EmailExists);
    }

    let password_hash = hash_password(&req.password).map_err(|_| AuthError::InvalidCredentials)?;

    // The first account administers the vault; everyone after that starts as
    // a contributor.
    let user_count = user_repo
        .count_users()
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
    let role = if user_count == 0 {
        UserRole::Admin
    } else {
        UserRole::Contributor
    };

    let new_user = User {
        id: Uuid::new_v4(),
        email: req.email,
        display_name: req.display_name,
        avatar_url: None,
        password_hash,
        role,
        active: true,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };

    let user = user_repo
        .create_user(&new_user)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    let token = app_state
        .jwt_service
        .create_token_for_user(user.id, user.email.clone(), user.role.to_string())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(Json(AuthResponse {
        token,
        user: UserInfo::from(user),
    }))
}

async fn get_profile(auth_user: AuthenticatedUser) -> Result<Json<UserInfo>, AuthError> {
    Ok(Json(UserInfo::from(auth_user.user)))
}

async fn list_users(
    State(app_state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserInfo>>, AuthError> {
    let user_repo = UserRepository::new(app_state.database.pool().clone());
    let users = user_repo
        .list_users(None, None)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    Ok(Json(users.into_iter().map(UserInfo::from).collect()))
}

async fn update_profile(
    State(app_state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserInfo>, crate::api::ApiError> {
    use crate::api::ApiError;

    req.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let user_repo = UserRepository::new(app_state.database.pool().clone());
    let updated = user_repo
        .update_profile(
            auth_user.user.id,
            req.display_name.as_deref(),
            req.avatar_url.as_ref().map(|url| url.as_deref()),
        )
        .await
        .map_err(ApiError::db)?;

    Ok(Json(UserInfo::from(updated)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_update_distinguishes_null_from_absent() {
        let clear: UpdateProfileRequest =
            serde_json::from_str(r#"{"avatar_url": null}"#).unwrap();
        assert_eq!(clear.avatar_url, Some(None));

        let keep: UpdateProfileRequest = serde_json::from_str("{}").unwrap();
        assert!(keep.avatar_url.is_none());

        let set: UpdateProfileRequest =
            serde_json::from_str(r#"{"avatar_url": "https://example.com/a.png"}"#).unwrap();
        assert_eq!(
            set.avatar_url,
            Some(Some("https://example.com/a.png".to_string()))
        );
    }
}
