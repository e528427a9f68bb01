use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::sync::atomic::{AtomicUsize, Ordering};

static TEST_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Create an isolated in-memory SQLite database for testing
pub async fn create_test_database() -> Result<Pool<Sqlite>> {
    let counter = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let db_name = format!("file:test_db_{}?mode=memory&cache=shared", counter);

    let pool = SqlitePoolOptions::new()
        .max_connections(1) // SQLite in-memory works best with single connection
        .connect(&db_name)
        .await?;

    setup_test_schema(&pool).await?;

    Ok(pool)
}

/// SQLite mirror of the PostgreSQL schema, close enough for exercising raw
/// query shapes (tags are stored as comma-joined text here).
async fn setup_test_schema(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            display_name TEXT NOT NULL,
            avatar_url TEXT,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'contributor',
            active BOOLEAN NOT NULL DEFAULT true,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS courses (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT,
            color TEXT NOT NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS folders (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            parent_id TEXT REFERENCES folders(id) ON DELETE SET NULL,
            owner_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS resources (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            file_key TEXT NOT NULL,
            folder_id TEXT REFERENCES folders(id) ON DELETE SET NULL,
            course_id TEXT REFERENCES courses(id) ON DELETE SET NULL,
            owner_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            resource_type TEXT NOT NULL DEFAULT 'other',
            mime_type TEXT NOT NULL,
            size INTEGER NOT NULL DEFAULT 0,
            checksum TEXT,
            tags TEXT NOT NULL DEFAULT '',
            description TEXT,
            semester TEXT,
            year TEXT,
            visibility TEXT NOT NULL DEFAULT 'private',
            download_count INTEGER NOT NULL DEFAULT 0,
            view_count INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS favorites (
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            resource_id TEXT NOT NULL REFERENCES resources(id) ON DELETE CASCADE,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (user_id, resource_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_isolated_databases() {
        let db1 = create_test_database().await.unwrap();
        let db2 = create_test_database().await.unwrap();

        sqlx::query(
            "INSERT INTO users (id, email, display_name, password_hash) \
             VALUES ('1', 'a@test.com', 'A', 'hash1')",
        )
        .execute(&db1)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO users (id, email, display_name, password_hash) \
             VALUES ('2', 'b@test.com', 'B', 'hash2')",
        )
        .execute(&db2)
        .await
        .unwrap();

        let count1: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&db1)
            .await
            .unwrap();

        let count2: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&db2)
            .await
            .unwrap();

        assert_eq!(count1, 1);
        assert_eq!(count2, 1);
    }

    #[tokio::test]
    async fn favorite_primary_key_deduplicates() {
        let db = create_test_database().await.unwrap();

        sqlx::query(
            "INSERT INTO users (id, email, display_name, password_hash) \
             VALUES ('u1', 'u@test.com', 'U', 'hash')",
        )
        .execute(&db)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO resources (id, title, file_key, owner_id, mime_type) \
             VALUES ('r1', 'Notes', 'k1', 'u1', 'text/plain')",
        )
        .execute(&db)
        .await
        .unwrap();

        sqlx::query("INSERT INTO favorites (user_id, resource_id) VALUES ('u1', 'r1')")
            .execute(&db)
            .await
            .unwrap();
        // Second insert hits the composite primary key
        let dup = sqlx::query("INSERT INTO favorites (user_id, resource_id) VALUES ('u1', 'r1')")
            .execute(&db)
            .await;
        assert!(dup.is_err());
    }
}
