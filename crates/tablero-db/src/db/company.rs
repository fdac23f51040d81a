use tablero_core::{
    models::{Company, CompanyMember, MemberRole},
    AppError,
};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const COMPANY_COLUMNS: &str = "id, name, contact_email, contact_phone, description, website_url, \
     logo_url, created_by, last_edited_by, created_at, updated_at";

const MEMBER_COLUMNS: &str =
    "id, company_id, user_id, role, full_name, phone, created_at, updated_at";

/// Repository for companies (tenants).
#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "companies", db.operation = "insert"))]
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        name: String,
        contact_email: Option<String>,
        contact_phone: Option<String>,
        description: Option<String>,
        website_url: Option<String>,
        logo_url: Option<String>,
        created_by: Uuid,
    ) -> Result<Company, AppError> {
        let company = sqlx::query_as::<Postgres, Company>(&format!(
            r#"
            INSERT INTO companies
                (name, contact_email, contact_phone, description, website_url, logo_url,
                 created_by, last_edited_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {COMPANY_COLUMNS}
            "#
        ))
        .bind(&name)
        .bind(&contact_email)
        .bind(&contact_phone)
        .bind(&description)
        .bind(&website_url)
        .bind(&logo_url)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(company)
    }

    #[tracing::instrument(skip(self), fields(db.table = "companies", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<Postgres, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    /// List companies the given user belongs to; platform admins list all.
    #[tracing::instrument(skip(self), fields(db.table = "companies", db.operation = "select"))]
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        is_platform_admin: bool,
    ) -> Result<Vec<Company>, AppError> {
        let companies = if is_platform_admin {
            sqlx::query_as::<Postgres, Company>(&format!(
                "SELECT {COMPANY_COLUMNS} FROM companies ORDER BY name ASC"
            ))
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<Postgres, Company>(&format!(
                r#"
                SELECT {COMPANY_COLUMNS} FROM companies c
                WHERE EXISTS (
                    SELECT 1 FROM company_members m
                    WHERE m.company_id = c.id AND m.user_id = $1
                )
                ORDER BY name ASC
                "#
            ))
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(companies)
    }

    #[tracing::instrument(skip(self), fields(db.table = "companies", db.operation = "update", db.record_id = %id))]
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<String>,
        contact_email: Option<String>,
        contact_phone: Option<String>,
        description: Option<String>,
        website_url: Option<String>,
        logo_url: Option<String>,
        edited_by: Uuid,
    ) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<Postgres, Company>(&format!(
            r#"
            UPDATE companies SET
                name = COALESCE($2, name),
                contact_email = COALESCE($3, contact_email),
                contact_phone = COALESCE($4, contact_phone),
                description = COALESCE($5, description),
                website_url = COALESCE($6, website_url),
                logo_url = COALESCE($7, logo_url),
                last_edited_by = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COMPANY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&name)
        .bind(&contact_email)
        .bind(&contact_phone)
        .bind(&description)
        .bind(&website_url)
        .bind(&logo_url)
        .bind(edited_by)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }
}

/// Repository for company memberships.
#[derive(Clone)]
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach a user to a company. The (company, user) pair is unique; a
    /// second attach surfaces as a Conflict.
    #[tracing::instrument(skip(self), fields(db.table = "company_members", db.operation = "insert"))]
    pub async fn create(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
        full_name: Option<String>,
        phone: Option<String>,
    ) -> Result<CompanyMember, AppError> {
        let member = sqlx::query_as::<Postgres, CompanyMember>(&format!(
            r#"
            INSERT INTO company_members (company_id, user_id, role, full_name, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(company_id)
        .bind(user_id)
        .bind(role)
        .bind(&full_name)
        .bind(&phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(
                "User is already a member of this company".to_string(),
            ),
            _ => AppError::from(e),
        })?;

        Ok(member)
    }

    #[tracing::instrument(skip(self), fields(db.table = "company_members", db.operation = "select"))]
    pub async fn get(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CompanyMember>, AppError> {
        let member = sqlx::query_as::<Postgres, CompanyMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM company_members WHERE company_id = $1 AND user_id = $2"
        ))
        .bind(company_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    #[tracing::instrument(skip(self), fields(db.table = "company_members", db.operation = "select"))]
    pub async fn list_for_company(&self, company_id: Uuid) -> Result<Vec<CompanyMember>, AppError> {
        let members = sqlx::query_as::<Postgres, CompanyMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM company_members WHERE company_id = $1 ORDER BY created_at ASC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Role of a user within a company, if they are a member.
    #[tracing::instrument(skip(self), fields(db.table = "company_members", db.operation = "select"))]
    pub async fn get_role(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MemberRole>, AppError> {
        let role = sqlx::query_scalar::<Postgres, MemberRole>(
            "SELECT role FROM company_members WHERE company_id = $1 AND user_id = $2",
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    #[tracing::instrument(skip(self), fields(db.table = "company_members", db.operation = "update"))]
    pub async fn update_role(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<Option<CompanyMember>, AppError> {
        let member = sqlx::query_as::<Postgres, CompanyMember>(&format!(
            r#"
            UPDATE company_members SET role = $3, updated_at = NOW()
            WHERE company_id = $1 AND user_id = $2
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(company_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }
}
