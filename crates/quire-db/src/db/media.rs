use crate::db::transaction::TransactionGuard;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quire_core::models::{Media, MediaMeta, MediaStatus, MediaType};
use quire_core::AppError;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn create(&self, media: &Media) -> Result<(), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Media>, AppError>;

    /// Ready media of one kind, newest first.
    async fn list_ready(
        &self,
        media_type: MediaType,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Media>, AppError>;

    async fn count_ready(&self, media_type: MediaType) -> Result<i64, AppError>;

    /// Remove the record. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(FromRow)]
struct MediaRow {
    id: Uuid,
    uploader_id: String,
    title: String,
    description: Option<String>,
    file_name: String,
    file_key: String,
    file_url: String,
    file_size: i64,
    content_type: String,
    media_type: MediaType,
    status: MediaStatus,
    thumbnail: Option<String>,
    preview: Option<String>,
    meta: Option<Json<MediaMeta>>,
    category: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MediaRow> for Media {
    fn from(row: MediaRow) -> Self {
        Media {
            id: row.id,
            uploader_id: row.uploader_id,
            title: row.title,
            description: row.description,
            file_name: row.file_name,
            file_key: row.file_key,
            file_url: row.file_url,
            file_size: row.file_size,
            content_type: row.content_type,
            media_type: row.media_type,
            status: row.status,
            thumbnail: row.thumbnail,
            preview: row.preview,
            meta: row.meta.map(|j| j.0),
            category: row.category,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const MEDIA_COLUMNS: &str = "id, uploader_id, title, description, file_name, file_key, file_url, \
     file_size, content_type, media_type, status, thumbnail, preview, meta, category, \
     created_at, updated_at";

#[derive(Clone)]
pub struct PostgresMediaRepository {
    pool: PgPool,
}

impl PostgresMediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaRepository for PostgresMediaRepository {
    #[tracing::instrument(
        skip(self, media),
        fields(db.table = "media", db.operation = "insert", media.id = %media.id)
    )]
    async fn create(&self, media: &Media) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO media
                (id, uploader_id, title, description, file_name, file_key, file_url, file_size,
                 content_type, media_type, status, thumbnail, preview, meta, category,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(media.id)
        .bind(&media.uploader_id)
        .bind(&media.title)
        .bind(&media.description)
        .bind(&media.file_name)
        .bind(&media.file_key)
        .bind(&media.file_url)
        .bind(media.file_size)
        .bind(&media.content_type)
        .bind(media.media_type)
        .bind(media.status)
        .bind(&media.thumbnail)
        .bind(&media.preview)
        .bind(media.meta.clone().map(Json))
        .bind(&media.category)
        .bind(media.created_at)
        .bind(media.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select"))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Media>, AppError> {
        let row = sqlx::query_as::<Postgres, MediaRow>(&format!(
            "SELECT {} FROM media WHERE id = $1",
            MEDIA_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Media::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select"))]
    async fn list_ready(
        &self,
        media_type: MediaType,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Media>, AppError> {
        let rows = sqlx::query_as::<Postgres, MediaRow>(&format!(
            "SELECT {} FROM media WHERE media_type = $1 AND status = $2 \
             ORDER BY created_at DESC, id ASC LIMIT $3 OFFSET $4",
            MEDIA_COLUMNS
        ))
        .bind(media_type)
        .bind(MediaStatus::Ready)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Media::from).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "count"))]
    async fn count_ready(&self, media_type: MediaType) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM media WHERE media_type = $1 AND status = $2")
                .bind(media_type)
                .bind(MediaStatus::Ready)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "delete"))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        // Lock the row so a concurrent delete observes it gone.
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM media WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(tx.connection()?)
                .await?;

        if locked.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(tx.connection()?)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
