use sqlx::{PgPool, Postgres};
use tablero_core::{models::FilterPreference, AppError};
use uuid::Uuid;

const PREFERENCE_COLUMNS: &str = "id, user_id, company_id, item_type, attribute_ids, updated_at";

/// Repository for per-user advanced-filter selections.
#[derive(Clone)]
pub struct FilterPreferenceRepository {
    pool: PgPool,
}

impl FilterPreferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "user_filter_preferences", db.operation = "select"))]
    pub async fn get(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        item_type: &str,
    ) -> Result<Option<FilterPreference>, AppError> {
        let preference = sqlx::query_as::<Postgres, FilterPreference>(&format!(
            "SELECT {PREFERENCE_COLUMNS} FROM user_filter_preferences \
             WHERE user_id = $1 AND company_id = $2 AND item_type = $3"
        ))
        .bind(user_id)
        .bind(company_id)
        .bind(item_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(preference)
    }

    /// Replace the selection for one (user, company, item_type) scope.
    #[tracing::instrument(skip(self, attribute_ids), fields(db.table = "user_filter_preferences", db.operation = "upsert"))]
    pub async fn upsert(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        item_type: &str,
        attribute_ids: Vec<Uuid>,
    ) -> Result<FilterPreference, AppError> {
        let preference = sqlx::query_as::<Postgres, FilterPreference>(&format!(
            r#"
            INSERT INTO user_filter_preferences (user_id, company_id, item_type, attribute_ids)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, company_id, item_type) DO UPDATE SET
                attribute_ids = EXCLUDED.attribute_ids,
                updated_at = NOW()
            RETURNING {PREFERENCE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(company_id)
        .bind(item_type)
        .bind(&attribute_ids)
        .fetch_one(&self.pool)
        .await?;

        Ok(preference)
    }
}
