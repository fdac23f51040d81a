use tablero_core::{models::UserIdentity, AppError};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const IDENTITY_COLUMNS: &str = "id, email, password_hash, is_platform_admin, created_at";

/// Repository for login identities. Stands in for the external auth
/// provider: identity creation is the first step of the create-user saga and
/// `delete` is its compensation.
#[derive(Clone)]
pub struct IdentityRepository {
    pool: PgPool,
}

impl IdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, password_hash), fields(db.table = "user_identities", db.operation = "insert"))]
    pub async fn create(
        &self,
        email: String,
        password_hash: Option<String>,
    ) -> Result<UserIdentity, AppError> {
        let identity = sqlx::query_as::<Postgres, UserIdentity>(&format!(
            r#"
            INSERT INTO user_identities (email, password_hash)
            VALUES ($1, $2)
            RETURNING {IDENTITY_COLUMNS}
            "#
        ))
        .bind(&email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("A user with this email already exists".to_string())
            }
            _ => AppError::from(e),
        })?;

        Ok(identity)
    }

    /// Compensating delete for the create-user saga: removes the identity
    /// created in step one when attaching the membership fails.
    #[tracing::instrument(skip(self), fields(db.table = "user_identities", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_identities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "user_identities", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<UserIdentity>, AppError> {
        let identity = sqlx::query_as::<Postgres, UserIdentity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM user_identities WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(identity)
    }

    #[tracing::instrument(skip(self), fields(db.table = "user_identities", db.operation = "select"))]
    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserIdentity>, AppError> {
        let identity = sqlx::query_as::<Postgres, UserIdentity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM user_identities WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(identity)
    }

    /// All identities; platform-admin listing. Company admins use the
    /// company-scoped variant instead.
    #[tracing::instrument(skip(self), fields(db.table = "user_identities", db.operation = "select"))]
    pub async fn list_all(&self) -> Result<Vec<UserIdentity>, AppError> {
        let identities = sqlx::query_as::<Postgres, UserIdentity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM user_identities ORDER BY email ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(identities)
    }

    /// Identities that are members of the given company.
    #[tracing::instrument(skip(self), fields(db.table = "user_identities", db.operation = "select"))]
    pub async fn list_for_company(&self, company_id: Uuid) -> Result<Vec<UserIdentity>, AppError> {
        let identities = sqlx::query_as::<Postgres, UserIdentity>(
            r#"
            SELECT u.id, u.email, u.password_hash, u.is_platform_admin, u.created_at
            FROM user_identities u
            JOIN company_members m ON m.user_id = u.id
            WHERE m.company_id = $1
            ORDER BY u.email ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(identities)
    }
}
