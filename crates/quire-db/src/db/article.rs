use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quire_core::models::{Article, ArticleInput, ArticleStatus, ArticleSummary};
use quire_core::AppError;
use sqlx::{FromRow, PgPool, Postgres};

#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn create(&self, input: &ArticleInput) -> Result<Article, AppError>;

    /// Replace the editable fields. `None` when no article has this id.
    async fn update(&self, id: i64, input: &ArticleInput) -> Result<Option<Article>, AppError>;

    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, AppError>;

    /// One page of articles without bodies, ordered by id ascending.
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<ArticleSummary>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;
}

#[derive(FromRow)]
struct ArticleRow {
    id: i64,
    user_id: i64,
    title: String,
    content: String,
    status: i16,
    tags: String,
    author: String,
    excerpt: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            content: row.content,
            status: ArticleStatus::from_i16(row.status).unwrap_or_default(),
            tags: row.tags,
            author: row.author,
            excerpt: row.excerpt,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ArticleSummaryRow {
    id: i64,
    user_id: i64,
    title: String,
    status: i16,
    tags: String,
    author: String,
    excerpt: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ArticleSummaryRow> for ArticleSummary {
    fn from(row: ArticleSummaryRow) -> Self {
        ArticleSummary {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            status: ArticleStatus::from_i16(row.status).unwrap_or_default(),
            tags: row.tags,
            author: row.author,
            excerpt: row.excerpt,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PostgresArticleRepository {
    pool: PgPool,
}

impl PostgresArticleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleRepository for PostgresArticleRepository {
    #[tracing::instrument(
        skip(self, input),
        fields(db.table = "articles", db.operation = "insert")
    )]
    async fn create(&self, input: &ArticleInput) -> Result<Article, AppError> {
        let row = sqlx::query_as::<Postgres, ArticleRow>(
            r#"
            INSERT INTO articles
                (user_id, title, content, status, tags, author, excerpt, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            RETURNING id, user_id, title, content, status, tags, author, excerpt,
                created_at, updated_at
            "#,
        )
        .bind(input.user_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.status.as_i16())
        .bind(&input.tags)
        .bind(&input.author)
        .bind(&input.excerpt)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    #[tracing::instrument(
        skip(self, input),
        fields(db.table = "articles", db.operation = "update")
    )]
    async fn update(&self, id: i64, input: &ArticleInput) -> Result<Option<Article>, AppError> {
        let row = sqlx::query_as::<Postgres, ArticleRow>(
            r#"
            UPDATE articles
            SET user_id = $2, title = $3, content = $4, status = $5, tags = $6,
                author = $7, excerpt = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, title, content, status, tags, author, excerpt,
                created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(input.user_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.status.as_i16())
        .bind(&input.tags)
        .bind(&input.author)
        .bind(&input.excerpt)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Article::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "articles", db.operation = "delete"))]
    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "articles", db.operation = "select"))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, AppError> {
        let row = sqlx::query_as::<Postgres, ArticleRow>(
            r#"
            SELECT id, user_id, title, content, status, tags, author, excerpt,
                created_at, updated_at
            FROM articles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Article::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "articles", db.operation = "select"))]
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<ArticleSummary>, AppError> {
        let rows = sqlx::query_as::<Postgres, ArticleSummaryRow>(
            r#"
            SELECT id, user_id, title, status, tags, author, excerpt, created_at, updated_at
            FROM articles
            ORDER BY id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ArticleSummary::from).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "articles", db.operation = "count"))]
    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
