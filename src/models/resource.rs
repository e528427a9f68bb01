use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub file_key: String,
    pub folder_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub resource_type: ResourceType,
    pub mime_type: String,
    pub size: i64,
    pub checksum: Option<String>,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub semester: Option<String>,
    pub year: Option<String>,
    pub visibility: Visibility,
    pub download_count: i64,
    pub view_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// The nine resource categories. Every stored resource carries exactly one,
/// assigned by the classifier at upload time.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Type)]
#[sqlx(type_name = "varchar")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Pdf,
    Video,
    Image,
    Audio,
    Note,
    Archive,
    Software,
    Code,
    Other,
}

impl ResourceType {
    pub const ALL: [ResourceType; 9] = [
        ResourceType::Pdf,
        ResourceType::Video,
        ResourceType::Image,
        ResourceType::Audio,
        ResourceType::Note,
        ResourceType::Archive,
        ResourceType::Software,
        ResourceType::Code,
        ResourceType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Pdf => "pdf",
            ResourceType::Video => "video",
            ResourceType::Image => "image",
            ResourceType::Audio => "audio",
            ResourceType::Note => "note",
            ResourceType::Archive => "archive",
            ResourceType::Software => "software",
            ResourceType::Code => "code",
            ResourceType::Other => "other",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown resource type: {}", s))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Type)]
#[sqlx(type_name = "varchar")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Shared,
    Public,
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Visibility::Private),
            "shared" => Ok(Visibility::Shared),
            "public" => Ok(Visibility::Public),
            other => Err(format!("Unknown visibility: {}", other)),
        }
    }
}

/// Course/folder summaries joined onto a listed resource, matching what the
/// library view renders on each card.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResourceWithRefs {
    #[serde(flatten)]
    pub resource: Resource,
    pub course: Option<CourseRef>,
    pub folder: Option<FolderRef>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CourseRef {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FolderRef {
    pub id: Uuid,
    pub name: String,
}
