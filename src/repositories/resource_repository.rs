use crate::models::{CourseRef, FolderRef, Resource, ResourceType, ResourceWithRefs, Visibility};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    #[default]
    Newest,
    Oldest,
    Name,
    Size,
}

/// Folder scoping for a listing: unscoped, top-level only, or one folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderScope {
    #[default]
    Any,
    Root,
    In(Uuid),
}

/// Filter state for the library listing, mirroring the filter bar: free-text
/// search, type and course filters, folder scope and sort order.
#[derive(Debug, Clone)]
pub struct ResourceFilter {
    /// Rows visible to this user: their own plus shared/public ones.
    pub viewer_id: Uuid,
    pub search: Option<String>,
    pub resource_type: Option<ResourceType>,
    pub course_id: Option<Uuid>,
    pub folder: FolderScope,
    pub sort: SortOption,
}

impl ResourceFilter {
    pub fn for_viewer(viewer_id: Uuid) -> Self {
        Self {
            viewer_id,
            search: None,
            resource_type: None,
            course_id: None,
            folder: FolderScope::Any,
            sort: SortOption::Newest,
        }
    }
}

const LIST_COLUMNS: &str = "r.id, r.title, r.file_key, r.folder_id, r.course_id, r.owner_id, \
     r.resource_type, r.mime_type, r.size, r.checksum, r.tags, r.description, \
     r.semester, r.year, r.visibility, r.download_count, r.view_count, \
     r.created_at, r.updated_at, \
     c.name AS course_name, c.code AS course_code, c.color AS course_color, \
     f.name AS folder_name";

/// Builds the listing query from the filter state. Pure with respect to the
/// filter, so predicate and ordering composition is testable without a
/// database.
pub fn build_list_query(filter: &ResourceFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!(
        "SELECT {LIST_COLUMNS} FROM resources r \
         LEFT JOIN courses c ON c.id = r.course_id \
         LEFT JOIN folders f ON f.id = r.folder_id \
         WHERE (r.owner_id = "
    ));
    query.push_bind(filter.viewer_id);
    query.push(" OR r.visibility <> 'private')");

    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        query.push(" AND (r.title ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR r.description ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }

    if let Some(resource_type) = filter.resource_type {
        query.push(" AND r.resource_type = ");
        query.push_bind(resource_type.as_str());
    }

    if let Some(course_id) = filter.course_id {
        query.push(" AND r.course_id = ");
        query.push_bind(course_id);
    }

    match filter.folder {
        FolderScope::Any => {}
        FolderScope::Root => {
            query.push(" AND r.folder_id IS NULL");
        }
        FolderScope::In(folder_id) => {
            query.push(" AND r.folder_id = ");
            query.push_bind(folder_id);
        }
    }

    query.push(match filter.sort {
        SortOption::Newest => " ORDER BY r.created_at DESC",
        SortOption::Oldest => " ORDER BY r.created_at ASC",
        SortOption::Name => " ORDER BY r.title ASC",
        SortOption::Size => " ORDER BY r.size DESC",
    });

    query
}

#[derive(Debug, FromRow)]
struct ResourceListRow {
    id: Uuid,
    title: String,
    file_key: String,
    folder_id: Option<Uuid>,
    course_id: Option<Uuid>,
    owner_id: Uuid,
    resource_type: ResourceType,
    mime_type: String,
    size: i64,
    checksum: Option<String>,
    tags: Vec<String>,
    description: Option<String>,
    semester: Option<String>,
    year: Option<String>,
    visibility: Visibility,
    download_count: i64,
    view_count: i64,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    course_name: Option<String>,
    course_code: Option<String>,
    course_color: Option<String>,
    folder_name: Option<String>,
}

impl From<ResourceListRow> for ResourceWithRefs {
    fn from(row: ResourceListRow) -> Self {
        let course = match (row.course_id, row.course_name, row.course_color) {
            (Some(id), Some(name), Some(color)) => Some(CourseRef {
                id,
                name,
                code: row.course_code,
                color,
            }),
            _ => None,
        };
        let folder = match (row.folder_id, row.folder_name) {
            (Some(id), Some(name)) => Some(FolderRef { id, name }),
            _ => None,
        };
        ResourceWithRefs {
            resource: Resource {
                id: row.id,
                title: row.title,
                file_key: row.file_key,
                folder_id: row.folder_id,
                course_id: row.course_id,
                owner_id: row.owner_id,
                resource_type: row.resource_type,
                mime_type: row.mime_type,
                size: row.size,
                checksum: row.checksum,
                tags: row.tags,
                description: row.description,
                semester: row.semester,
                year: row.year,
                visibility: row.visibility,
                download_count: row.download_count,
                view_count: row.view_count,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            course,
            folder,
        }
    }
}

const RESOURCE_COLUMNS: &str = "id, title, file_key, folder_id, course_id, owner_id, \
     resource_type, mime_type, size, checksum, tags, description, semester, year, \
     visibility, download_count, view_count, created_at, updated_at";

/// Fields an owner may edit after upload. The nullable ones are doubly
/// optional so a request can distinguish "leave unchanged" (absent) from
/// "clear" (explicit null); `double_option` keeps JSON null from collapsing
/// into the outer `None`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ResourceUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "serde_with::rust::double_option::deserialize")]
    pub description: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "serde_with::rust::double_option::deserialize")]
    pub course_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "serde_with::rust::double_option::deserialize")]
    pub folder_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "serde_with::rust::double_option::deserialize")]
    pub semester: Option<Option<String>>,
    #[serde(default, deserialize_with = "serde_with::rust::double_option::deserialize")]
    pub year: Option<Option<String>>,
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Serialize)]
pub struct TypeUsage {
    pub resource_type: ResourceType,
    pub count: i64,
    pub size: i64,
}

#[derive(Debug, Serialize)]
pub struct StorageStats {
    pub total_files: i64,
    pub total_size: i64,
    pub by_type: Vec<TypeUsage>,
}

pub struct ResourceRepository {
    pool: PgPool,
}

impl ResourceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &ResourceFilter) -> Result<Vec<ResourceWithRefs>> {
        let mut query = build_list_query(filter);
        let rows: Vec<ResourceListRow> = query
            .build_query_as::<ResourceListRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ResourceWithRefs::from).collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Resource>> {
        let resource = sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(resource)
    }

    pub async fn create(&self, resource: &Resource) -> Result<Resource> {
        let created = sqlx::query_as::<_, Resource>(&format!(
            "INSERT INTO resources (id, title, file_key, folder_id, course_id, owner_id, \
             resource_type, mime_type, size, checksum, tags, description, semester, year, \
             visibility, download_count, view_count) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             RETURNING {RESOURCE_COLUMNS}"
        ))
        .bind(resource.id)
        .bind(&resource.title)
        .bind(&resource.file_key)
        .bind(resource.folder_id)
        .bind(resource.course_id)
        .bind(resource.owner_id)
        .bind(resource.resource_type)
        .bind(&resource.mime_type)
        .bind(resource.size)
        .bind(&resource.checksum)
        .bind(&resource.tags)
        .bind(&resource.description)
        .bind(&resource.semester)
        .bind(&resource.year)
        .bind(resource.visibility)
        .bind(resource.download_count)
        .bind(resource.view_count)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn update(&self, id: Uuid, update: ResourceUpdate) -> Result<Resource> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Resource not found"))?;

        let updated = sqlx::query_as::<_, Resource>(&format!(
            "UPDATE resources SET title = $2, description = $3, tags = $4, course_id = $5, \
             folder_id = $6, semester = $7, year = $8, visibility = $9, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {RESOURCE_COLUMNS}"
        ))
        .bind(id)
        .bind(update.title.unwrap_or(existing.title))
        .bind(update.description.unwrap_or(existing.description))
        .bind(update.tags.unwrap_or(existing.tags))
        .bind(update.course_id.unwrap_or(existing.course_id))
        .bind(update.folder_id.unwrap_or(existing.folder_id))
        .bind(update.semester.unwrap_or(existing.semester))
        .bind(update.year.unwrap_or(existing.year))
        .bind(update.visibility.unwrap_or(existing.visibility))
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Atomic counter bump; returns the new count. A read-then-write here
    /// would lose updates under concurrent downloads.
    pub async fn increment_download_count(&self, id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "UPDATE resources SET download_count = download_count + 1 WHERE id = $1 \
             RETURNING download_count",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn increment_view_count(&self, id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "UPDATE resources SET view_count = view_count + 1 WHERE id = $1 \
             RETURNING view_count",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn get_storage_stats(&self, viewer_id: Uuid) -> Result<StorageStats> {
        let rows: Vec<(ResourceType, i64, i64)> = sqlx::query_as(
            "SELECT resource_type, COUNT(*), COALESCE(SUM(size), 0)::BIGINT \
             FROM resources \
             WHERE owner_id = $1 OR visibility <> 'private' \
             GROUP BY resource_type",
        )
        .bind(viewer_id)
        .fetch_all(&self.pool)
        .await?;

        let total_files = rows.iter().map(|(_, count, _)| count).sum();
        let total_size = rows.iter().map(|(_, _, size)| size).sum();
        let by_type = rows
            .into_iter()
            .map(|(resource_type, count, size)| TypeUsage {
                resource_type,
                count,
                size,
            })
            .collect();

        Ok(StorageStats {
            total_files,
            total_size,
            by_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_filter() -> ResourceFilter {
        ResourceFilter::for_viewer(Uuid::new_v4())
    }

    #[test]
    fn default_sort_is_newest_first() {
        let mut sql_owned = build_list_query(&base_filter());
        let sql = sql_owned.sql();
        assert!(sql.ends_with("ORDER BY r.created_at DESC"));
        assert!(!sql.contains("ILIKE"));
    }

    #[test]
    fn size_sort_orders_descending() {
        let mut filter = base_filter();
        filter.sort = SortOption::Size;
        let mut query = build_list_query(&filter);
        assert!(query.sql().ends_with("ORDER BY r.size DESC"));
    }

    #[test]
    fn name_and_oldest_sorts_order_ascending() {
        let mut filter = base_filter();
        filter.sort = SortOption::Name;
        assert!(build_list_query(&filter)
            .sql()
            .ends_with("ORDER BY r.title ASC"));

        filter.sort = SortOption::Oldest;
        assert!(build_list_query(&filter)
            .sql()
            .ends_with("ORDER BY r.created_at ASC"));
    }

    #[test]
    fn search_matches_title_or_description() {
        let mut filter = base_filter();
        filter.search = Some("calculus".to_string());
        let mut query = build_list_query(&filter);
        let sql = query.sql();
        assert!(sql.contains("r.title ILIKE"));
        assert!(sql.contains("r.description ILIKE"));
    }

    #[test]
    fn blank_search_is_ignored() {
        let mut filter = base_filter();
        filter.search = Some("   ".to_string());
        assert!(!build_list_query(&filter).sql().contains("ILIKE"));
    }

    #[test]
    fn type_and_course_filters_add_equality_predicates() {
        let mut filter = base_filter();
        filter.resource_type = Some(ResourceType::Pdf);
        filter.course_id = Some(Uuid::new_v4());
        let mut query = build_list_query(&filter);
        let sql = query.sql();
        assert!(sql.contains("r.resource_type ="));
        assert!(sql.contains("r.course_id ="));
    }

    #[test]
    fn folder_scopes() {
        let mut filter = base_filter();
        assert!(!build_list_query(&filter).sql().contains("r.folder_id"));

        filter.folder = FolderScope::Root;
        assert!(build_list_query(&filter)
            .sql()
            .contains("r.folder_id IS NULL"));

        filter.folder = FolderScope::In(Uuid::new_v4());
        let mut query = build_list_query(&filter);
        assert!(query.sql().contains("r.folder_id ="));
    }

    #[test]
    fn private_rows_are_limited_to_the_viewer() {
        let mut query = build_list_query(&base_filter());
        let sql = query.sql();
        assert!(sql.contains("r.owner_id ="));
        assert!(sql.contains("r.visibility <> 'private'"));
    }

    #[test]
    fn update_null_clears_and_absent_keeps() {
        let update: ResourceUpdate =
            serde_json::from_str(r#"{"folder_id": null, "description": null}"#).unwrap();
        assert_eq!(update.folder_id, Some(None));
        assert_eq!(update.description, Some(None));
        assert!(update.course_id.is_none());
        assert!(update.semester.is_none());
        assert!(update.title.is_none());
    }

    #[test]
    fn update_value_sets_the_field() {
        let id = Uuid::new_v4();
        let update: ResourceUpdate =
            serde_json::from_value(serde_json::json!({ "folder_id": id, "year": "2026" }))
                .unwrap();
        assert_eq!(update.folder_id, Some(Some(id)));
        assert_eq!(update.year, Some(Some("2026".to_string())));
    }
}
