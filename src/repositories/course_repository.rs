use crate::models::Course;
use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

pub struct CourseRepository {
    pool: PgPool,
}

impl CourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT id, name, code, color, created_at, updated_at FROM courses ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(
            "SELECT id, name, code, color, created_at, updated_at FROM courses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(course)
    }

    pub async fn create(&self, course: &Course) -> Result<Course> {
        let created = sqlx::query_as::<_, Course>(
            "INSERT INTO courses (id, name, code, color) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, code, color, created_at, updated_at",
        )
        .bind(course.id)
        .bind(&course.name)
        .bind(&course.code)
        .bind(&course.color)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
