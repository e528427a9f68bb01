use crate::auth::{claims::TokenClaims, errors::AuthError, jwt::JwtService};
use crate::config::AppConfig;
use crate::database::Database;
use crate::models::user::{User, UserRole};
use crate::repositories::user_repository::UserRepository;
use crate::services::storage::StorageService;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub storage: Arc<StorageService>,
    pub jwt_service: JwtService,
    pub config: AppConfig,
    pub startup_time: Instant,
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    #[allow(dead_code)]
    pub claims: TokenClaims,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token_from_auth_header(&parts.headers)?;
        extract_authenticated_user(state, &token).await
    }
}

// Role-based extractor for admin-only endpoints
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token_from_auth_header(&parts.headers)?;
        let auth_user = extract_authenticated_user(state, &token).await?;

        if auth_user.user.role != UserRole::Admin {
            warn!(
                "User {} attempted to access admin endpoint without admin role",
                auth_user.user.email
            );
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminUser(auth_user))
    }
}

fn extract_token_from_auth_header(headers: &axum::http::HeaderMap) -> Result<String, AuthError> {
    let auth_header = headers
        .get("authorization")
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    if let Some(token) = auth_header.strip_prefix("Bearer ") {
        Ok(token.to_string())
    } else {
        Err(AuthError::InvalidAuthHeader)
    }
}

/// Decodes the bearer token, rechecks expiry, and loads the active user row.
async fn extract_authenticated_user(
    state: &AppState,
    token: &str,
) -> Result<AuthenticatedUser, AuthError> {
    let claims = state.jwt_service.decode_token(token).map_err(|e| {
        debug!("Failed to decode token: {:?}", e);
        AuthError::InvalidToken(e.to_string())
    })?;

    if claims.is_expired() {
        warn!("Token expired for user ID: {}", claims.sub);
        return Err(AuthError::TokenExpired);
    }

    let user_repo = UserRepository::new(state.database.pool().clone());
    let user = user_repo
        .get_user(claims.sub)
        .await
        .map_err(|e| {
            error!("Database error while fetching user {}: {:?}", claims.sub, e);
            AuthError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| {
            warn!("User not found for ID: {}", claims.sub);
            AuthError::UserNotFound
        })?;

    if !user.active {
        warn!("Inactive user attempted to authenticate: {}", user.email);
        return Err(AuthError::UserInactive);
    }

    Ok(AuthenticatedUser { user, claims })
}
