use serde::Deserialize;
use sqlx::{PgPool, Postgres};
use tablero_core::{
    models::{Item, PublishStatus},
    AppError,
};
use uuid::Uuid;

const ITEM_COLUMNS: &str = "id, company_id, item_type, title, summary, status, created_by, \
     last_edited_by, created_at, updated_at";

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Sort direction for the listing's updated_at ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Fixed (database-side) filters for the item listing.
#[derive(Debug, Clone, Default)]
pub struct ItemListFilter {
    pub statuses: Vec<PublishStatus>,
    pub item_types: Vec<String>,
    pub sort: SortDirection,
    pub page: i64,
    pub page_size: i64,
}

/// One page of items plus pagination totals.
#[derive(Debug, Clone)]
pub struct ItemPage {
    pub items: Vec<Item>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

/// Repository for company-owned items.
#[derive(Clone)]
pub struct ItemRepository {
    pool: PgPool,
}

impl ItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "items", db.operation = "insert"))]
    pub async fn create(
        &self,
        company_id: Uuid,
        item_type: String,
        title: String,
        summary: Option<String>,
        status: PublishStatus,
        created_by: Uuid,
    ) -> Result<Item, AppError> {
        let item = sqlx::query_as::<Postgres, Item>(&format!(
            r#"
            INSERT INTO items (company_id, item_type, title, summary, status, created_by,
                               last_edited_by)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(company_id)
        .bind(&item_type)
        .bind(&title)
        .bind(&summary)
        .bind(status)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    #[tracing::instrument(skip(self), fields(db.table = "items", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Item>, AppError> {
        let item = sqlx::query_as::<Postgres, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    #[tracing::instrument(skip(self), fields(db.table = "items", db.operation = "update", db.record_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        title: Option<String>,
        summary: Option<String>,
        status: Option<PublishStatus>,
        edited_by: Uuid,
    ) -> Result<Option<Item>, AppError> {
        let item = sqlx::query_as::<Postgres, Item>(&format!(
            r#"
            UPDATE items SET
                title = COALESCE($2, title),
                summary = COALESCE($3, summary),
                status = COALESCE($4, status),
                last_edited_by = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&title)
        .bind(&summary)
        .bind(status)
        .bind(edited_by)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Delete an item. Attribute values and media metadata cascade.
    #[tracing::instrument(skip(self), fields(db.table = "items", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Paginated listing with the fixed filters (status multi-select,
    /// item_type multi-select, updated_at sort). Enum filters are bound as
    /// text arrays and cast, keeping the query a single prepared statement.
    #[tracing::instrument(skip(self, filter), fields(db.table = "items", db.operation = "select"))]
    pub async fn list(
        &self,
        company_id: Uuid,
        filter: &ItemListFilter,
    ) -> Result<ItemPage, AppError> {
        let page = filter.page.max(1);
        let page_size = match filter.page_size {
            n if n <= 0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        let offset = (page - 1) * page_size;

        let statuses: Vec<String> = filter
            .statuses
            .iter()
            .map(|s| {
                match s {
                    PublishStatus::Draft => "draft",
                    PublishStatus::Published => "published",
                    PublishStatus::Archived => "archived",
                }
                .to_string()
            })
            .collect();

        let where_clause = "company_id = $1 \
             AND (cardinality($2::text[]) = 0 OR status = ANY($2::publish_status[])) \
             AND (cardinality($3::text[]) = 0 OR item_type = ANY($3))";

        let total: i64 = sqlx::query_scalar::<Postgres, i64>(&format!(
            "SELECT COUNT(*) FROM items WHERE {where_clause}"
        ))
        .bind(company_id)
        .bind(&statuses)
        .bind(&filter.item_types)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<Postgres, Item>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE {where_clause} \
             ORDER BY updated_at {} LIMIT $4 OFFSET $5",
            filter.sort.as_sql()
        ))
        .bind(company_id)
        .bind(&statuses)
        .bind(&filter.item_types)
        .bind(page_size)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total_pages = if total == 0 {
            0
        } else {
            (total + page_size - 1) / page_size
        };

        Ok(ItemPage {
            items,
            total,
            page,
            page_size,
            total_pages,
        })
    }
}
