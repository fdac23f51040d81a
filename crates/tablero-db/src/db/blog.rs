use sqlx::{PgPool, Postgres};
use tablero_core::{
    models::{BlogPost, PublishStatus},
    AppError,
};
use uuid::Uuid;

const BLOG_COLUMNS: &str =
    "id, company_id, title, slug, body, status, created_by, created_at, updated_at";

/// Repository for company blog posts.
#[derive(Clone)]
pub struct BlogRepository {
    pool: PgPool,
}

impl BlogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, body), fields(db.table = "blog_posts", db.operation = "insert"))]
    pub async fn create(
        &self,
        company_id: Uuid,
        title: String,
        slug: String,
        body: String,
        status: PublishStatus,
        created_by: Uuid,
    ) -> Result<BlogPost, AppError> {
        let post = sqlx::query_as::<Postgres, BlogPost>(&format!(
            r#"
            INSERT INTO blog_posts (company_id, title, slug, body, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {BLOG_COLUMNS}
            "#
        ))
        .bind(company_id)
        .bind(&title)
        .bind(&slug)
        .bind(&body)
        .bind(status)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("A post with slug '{}' already exists", slug))
            }
            _ => AppError::from(e),
        })?;

        Ok(post)
    }

    #[tracing::instrument(skip(self), fields(db.table = "blog_posts", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<BlogPost>, AppError> {
        let post = sqlx::query_as::<Postgres, BlogPost>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blog_posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    #[tracing::instrument(skip(self), fields(db.table = "blog_posts", db.operation = "select"))]
    pub async fn list_for_company(&self, company_id: Uuid) -> Result<Vec<BlogPost>, AppError> {
        let posts = sqlx::query_as::<Postgres, BlogPost>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blog_posts WHERE company_id = $1 ORDER BY updated_at DESC"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    #[tracing::instrument(skip(self, body), fields(db.table = "blog_posts", db.operation = "update", db.record_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        title: Option<String>,
        body: Option<String>,
        status: Option<PublishStatus>,
    ) -> Result<Option<BlogPost>, AppError> {
        let post = sqlx::query_as::<Postgres, BlogPost>(&format!(
            r#"
            UPDATE blog_posts SET
                title = COALESCE($2, title),
                body = COALESCE($3, body),
                status = COALESCE($4, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {BLOG_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&title)
        .bind(&body)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    #[tracing::instrument(skip(self), fields(db.table = "blog_posts", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
