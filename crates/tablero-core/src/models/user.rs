use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A login identity. Company-level permissions live on `CompanyMember`, not
/// here; `is_platform_admin` marks operators of the platform itself.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserIdentity {
    pub id: Uuid,
    pub email: String,
    /// bcrypt hash; never serialized into API responses.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub is_platform_admin: bool,
    pub created_at: DateTime<Utc>,
}
