use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

pub struct FavoriteRepository {
    pool: PgPool,
}

impl FavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resource ids the user has favorited, newest first.
    pub async fn list_resource_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT resource_id FROM favorites WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    pub async fn exists(&self, user_id: Uuid, resource_id: Uuid) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM favorites WHERE user_id = $1 AND resource_id = $2",
        )
        .bind(user_id)
        .bind(resource_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Flips the favorite association and returns the new state. The
    /// composite primary key absorbs a concurrent duplicate insert.
    pub async fn toggle(&self, user_id: Uuid, resource_id: Uuid) -> Result<bool> {
        let deleted = sqlx::query(
            "DELETE FROM favorites WHERE user_id = $1 AND resource_id = $2",
        )
        .bind(user_id)
        .bind(resource_id)
        .execute(&self.pool)
        .await?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO favorites (user_id, resource_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, resource_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(resource_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }
}
