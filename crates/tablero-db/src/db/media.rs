use sqlx::{PgPool, Postgres};
use tablero_core::{
    models::{ItemMedia, MediaFileType},
    AppError,
};
use uuid::Uuid;

const MEDIA_COLUMNS: &str = "id, item_id, company_id, file_type, url, storage_key, alt_text, \
     is_cover, sort_order, created_at";

/// Repository for item media metadata. The binary lives in object storage;
/// these rows carry the URL and the recovered storage key.
#[derive(Clone)]
pub struct ItemMediaRepository {
    pool: PgPool,
}

impl ItemMediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Current count of one file type for an item; checked against the
    /// per-item caps before any storage write happens.
    #[tracing::instrument(skip(self), fields(db.table = "item_media", db.operation = "select"))]
    pub async fn count_by_type(
        &self,
        item_id: Uuid,
        file_type: MediaFileType,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM item_media WHERE item_id = $1 AND file_type = $2",
        )
        .bind(item_id)
        .bind(file_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Insert the metadata row for an already-uploaded object. When the new
    /// row is a cover image, any previous cover on the item is demoted first
    /// (one cover per item).
    #[tracing::instrument(skip(self), fields(db.table = "item_media", db.operation = "insert"))]
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        item_id: Uuid,
        company_id: Uuid,
        file_type: MediaFileType,
        url: String,
        storage_key: String,
        alt_text: Option<String>,
        is_cover: bool,
        sort_order: i32,
    ) -> Result<ItemMedia, AppError> {
        let mut tx = self.pool.begin().await?;

        if is_cover && file_type == MediaFileType::Image {
            sqlx::query(
                "UPDATE item_media SET is_cover = FALSE \
                 WHERE item_id = $1 AND is_cover AND file_type = 'image'",
            )
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        }

        let media = sqlx::query_as::<Postgres, ItemMedia>(&format!(
            r#"
            INSERT INTO item_media
                (item_id, company_id, file_type, url, storage_key, alt_text, is_cover, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {MEDIA_COLUMNS}
            "#
        ))
        .bind(item_id)
        .bind(company_id)
        .bind(file_type)
        .bind(&url)
        .bind(&storage_key)
        .bind(&alt_text)
        .bind(is_cover && file_type == MediaFileType::Image)
        .bind(sort_order)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(media)
    }

    #[tracing::instrument(skip(self), fields(db.table = "item_media", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<ItemMedia>, AppError> {
        let media = sqlx::query_as::<Postgres, ItemMedia>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM item_media WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(media)
    }

    #[tracing::instrument(skip(self), fields(db.table = "item_media", db.operation = "select"))]
    pub async fn list_for_item(&self, item_id: Uuid) -> Result<Vec<ItemMedia>, AppError> {
        let media = sqlx::query_as::<Postgres, ItemMedia>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM item_media WHERE item_id = $1 \
             ORDER BY sort_order ASC, created_at ASC"
        ))
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(media)
    }

    /// Delete the metadata row, returning it so the caller can attempt the
    /// best-effort storage cleanup afterward.
    #[tracing::instrument(skip(self), fields(db.table = "item_media", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<Option<ItemMedia>, AppError> {
        let media = sqlx::query_as::<Postgres, ItemMedia>(&format!(
            "DELETE FROM item_media WHERE id = $1 RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(media)
    }
}
