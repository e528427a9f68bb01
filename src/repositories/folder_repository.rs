use crate::models::Folder;
use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(
            "SELECT id, name, parent_id, owner_id, created_at, updated_at \
             FROM folders WHERE owner_id = $1 ORDER BY name",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(folders)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(
            "SELECT id, name, parent_id, owner_id, created_at, updated_at \
             FROM folders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(folder)
    }

    pub async fn create(&self, folder: &Folder) -> Result<Folder> {
        let created = sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (id, name, parent_id, owner_id) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, parent_id, owner_id, created_at, updated_at",
        )
        .bind(folder.id)
        .bind(&folder.name)
        .bind(folder.parent_id)
        .bind(folder.owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn rename(&self, id: Uuid, name: &str) -> Result<Folder> {
        let renamed = sqlx::query_as::<_, Folder>(
            "UPDATE folders SET name = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING id, name, parent_id, owner_id, created_at, updated_at",
        )
        .bind(id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(renamed)
    }

    /// Deletes the folder. Child folders re-root and contained resources go
    /// folderless via the schema's ON DELETE SET NULL.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM folders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
