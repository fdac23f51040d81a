use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of file attached to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "media_file_type", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum MediaFileType {
    Image,
    Pdf,
}

impl MediaFileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFileType::Image => "image",
            MediaFileType::Pdf => "pdf",
        }
    }

    /// Classify an incoming MIME type; None means the upload is rejected.
    pub fn from_content_type(content_type: &str) -> Option<MediaFileType> {
        match content_type {
            "image/jpeg" | "image/png" | "image/webp" | "image/gif" => Some(MediaFileType::Image),
            "application/pdf" => Some(MediaFileType::Pdf),
            _ => None,
        }
    }
}

/// Image or pdf attached to an item. `is_cover` applies to images only and
/// at most one image per item carries it. Per-item counts are capped at
/// `MAX_ITEM_IMAGES` / `MAX_ITEM_PDFS`, enforced before any storage write.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ItemMedia {
    pub id: Uuid,
    pub item_id: Uuid,
    pub company_id: Uuid,
    pub file_type: MediaFileType,
    pub url: String,
    pub storage_key: String,
    pub alt_text: Option<String>,
    pub is_cover: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_classification() {
        assert_eq!(
            MediaFileType::from_content_type("image/png"),
            Some(MediaFileType::Image)
        );
        assert_eq!(
            MediaFileType::from_content_type("application/pdf"),
            Some(MediaFileType::Pdf)
        );
        assert_eq!(MediaFileType::from_content_type("video/mp4"), None);
    }
}
