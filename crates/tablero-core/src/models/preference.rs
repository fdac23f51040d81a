use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Per-user selection of which attribute definitions act as advanced filters
/// for one (company, item_type). Persisted so the choice survives sessions.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FilterPreference {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub item_type: String,
    pub attribute_ids: Vec<Uuid>,
    pub updated_at: DateTime<Utc>,
}
