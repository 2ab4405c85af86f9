use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quire_core::models::{Document, ImageRef};
use quire_core::AppError;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres};

/// Storage for rich-text documents.
///
/// Authorization is not this layer's concern: every method operates on
/// whatever ids it is given.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, AppError>;

    async fn exists(&self, id: &str) -> Result<bool, AppError>;

    async fn insert(&self, document: &Document) -> Result<(), AppError>;

    /// Overwrite every mutable column of an existing document.
    async fn save(&self, document: &Document) -> Result<(), AppError>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    /// Documents owned by `owner_id`, most recently updated first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Document>, AppError>;

    /// Public documents, most recently updated first.
    async fn list_published(&self, offset: i64, limit: i64) -> Result<Vec<Document>, AppError>;

    async fn count_published(&self) -> Result<i64, AppError>;

    /// Move every document owned by `from` to `to`, returning how many moved.
    async fn reassign_owner(&self, from: &str, to: &str) -> Result<u64, AppError>;

    /// Cheap round trip used by readiness checks.
    async fn ping(&self) -> Result<(), AppError>;
}

#[derive(FromRow)]
struct DocumentRow {
    id: String,
    owner_id: String,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    icon_image: Option<Json<ImageRef>>,
    cover_image: Option<Json<ImageRef>>,
    editor_json: Option<Value>,
    is_public: bool,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            created_at: row.created_at,
            updated_at: row.updated_at,
            icon_image: row.icon_image.map(|j| j.0),
            cover_image: row.cover_image.map(|j| j.0),
            editor_json: row.editor_json,
            is_public: row.is_public,
        }
    }
}

const DOCUMENT_COLUMNS: &str =
    "id, owner_id, title, created_at, updated_at, icon_image, cover_image, editor_json, is_public";

#[derive(Clone)]
pub struct PostgresDocumentRepository {
    pool: PgPool,
}

impl PostgresDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select"))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, AppError> {
        let row = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            "SELECT {} FROM documents WHERE id = $1",
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Document::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select"))]
    async fn exists(&self, id: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM documents WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    #[tracing::instrument(
        skip(self, document),
        fields(db.table = "documents", db.operation = "insert", document.id = %document.id)
    )]
    async fn insert(&self, document: &Document) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO documents
                (id, owner_id, title, created_at, updated_at, icon_image, cover_image,
                 editor_json, is_public)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&document.id)
        .bind(&document.owner_id)
        .bind(&document.title)
        .bind(document.created_at)
        .bind(document.updated_at)
        .bind(document.icon_image.clone().map(Json))
        .bind(document.cover_image.clone().map(Json))
        .bind(document.editor_json.clone())
        .bind(document.is_public)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(
        skip(self, document),
        fields(db.table = "documents", db.operation = "update", document.id = %document.id)
    )]
    async fn save(&self, document: &Document) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE documents
            SET owner_id = $2, title = $3, updated_at = $4, icon_image = $5,
                cover_image = $6, editor_json = $7, is_public = $8
            WHERE id = $1
            "#,
        )
        .bind(&document.id)
        .bind(&document.owner_id)
        .bind(&document.title)
        .bind(document.updated_at)
        .bind(document.icon_image.clone().map(Json))
        .bind(document.cover_image.clone().map(Json))
        .bind(document.editor_json.clone())
        .bind(document.is_public)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "delete"))]
    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select"))]
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Document>, AppError> {
        let rows = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            "SELECT {} FROM documents WHERE owner_id = $1 \
             ORDER BY updated_at DESC, id ASC",
            DOCUMENT_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Document::from).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "select"))]
    async fn list_published(&self, offset: i64, limit: i64) -> Result<Vec<Document>, AppError> {
        let rows = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            "SELECT {} FROM documents WHERE is_public = TRUE \
             ORDER BY updated_at DESC, id ASC LIMIT $1 OFFSET $2",
            DOCUMENT_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Document::from).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "count"))]
    async fn count_published(&self) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE is_public = TRUE")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    #[tracing::instrument(skip(self), fields(db.table = "documents", db.operation = "update"))]
    async fn reassign_owner(&self, from: &str, to: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE documents SET owner_id = $2, updated_at = GREATEST(NOW(), created_at) \
             WHERE owner_id = $1",
        )
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            rows = result.rows_affected(),
            "Reassigned document ownership"
        );

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
