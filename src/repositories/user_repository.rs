use crate::models::User;
use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, display_name, avatar_url, password_hash, role, active, \
     created_at, updated_at";

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_user(&self, user: &User) -> Result<User> {
        let result = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, display_name, avatar_url, password_hash, role, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.active)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn list_users(&self, limit: Option<u32>, offset: Option<u32>) -> Result<Vec<User>> {
        let limit = limit.unwrap_or(50);
        let offset = offset.unwrap_or(0);

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn count_users(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        display_name: Option<&str>,
        avatar_url: Option<Option<&str>>,
    ) -> Result<User> {
        let existing = self
            .get_user(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found"))?;

        let display_name = display_name.unwrap_or(&existing.display_name);
        let avatar_url = match avatar_url {
            Some(value) => value.map(str::to_string),
            None => existing.avatar_url.clone(),
        };

        let updated = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET display_name = $2, avatar_url = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(display_name)
        .bind(avatar_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }
}
