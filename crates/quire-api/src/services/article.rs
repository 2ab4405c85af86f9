use quire_core::models::{Article, ArticleInput, ArticleSummary};
use quire_core::pagination::{Page, DEFAULT_ARTICLE_PAGE_SIZE};
use quire_core::{AppError, PageRequest};
use quire_db::ArticleRepository;
use std::sync::Arc;
use validator::Validate;

/// Blog articles. Plain passthrough CRUD: no caller identity is involved in
/// any operation, so anyone can create, edit or delete any article.
#[derive(Clone)]
pub struct ArticleService {
    repository: Arc<dyn ArticleRepository>,
}

impl ArticleService {
    pub fn new(repository: Arc<dyn ArticleRepository>) -> Self {
        Self { repository }
    }

    pub async fn create(&self, input: ArticleInput) -> Result<Article, AppError> {
        input.validate()?;
        let article = self.repository.create(&input).await?;
        tracing::info!(article_id = article.id, "Article created");
        Ok(article)
    }

    pub async fn update(&self, id: i64, input: ArticleInput) -> Result<Article, AppError> {
        input.validate()?;
        self.repository
            .update(id, &input)
            .await?
            .ok_or_else(|| AppError::NotFound("Article not found".to_string()))
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if !self.repository.delete(id).await? {
            return Err(AppError::NotFound("Article not found".to_string()));
        }
        tracing::info!(article_id = id, "Article deleted");
        Ok(())
    }

    pub async fn get(&self, id: i64) -> Result<Article, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Article not found".to_string()))
    }

    /// Articles in id order. A missing or non-positive size means the default
    /// of 10; sizes above 100 are capped.
    pub async fn list(&self, page: i64, page_size: i64) -> Result<Page<ArticleSummary>, AppError> {
        let page_size = if page_size < 1 {
            DEFAULT_ARTICLE_PAGE_SIZE
        } else {
            page_size
        };
        let request = PageRequest::clamped(page, page_size);
        let total = self.repository.count().await?;
        let items = self
            .repository
            .list(request.offset(), request.limit())
            .await?;
        Ok(Page {
            items,
            total,
            request,
        })
    }
}
