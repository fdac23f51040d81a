use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Publication status shared by items and blog posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "publish_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    Draft,
    Published,
    Archived,
}

/// Generic company-owned record. `item_type` is a free-form string,
/// conventionally suffixed with the company name (see
/// `validation::attribute_key::qualify_item_type`). Custom fields live in
/// `AttributeValue` rows keyed by this item.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    pub id: Uuid,
    pub company_id: Uuid,
    pub item_type: String,
    pub title: String,
    pub summary: Option<String>,
    pub status: PublishStatus,
    pub created_by: Option<Uuid>,
    pub last_edited_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
