//! In-memory repositories
//!
//! Drop-in doubles for the PostgreSQL repositories, used by tests that want
//! the full HTTP stack without a database.

use crate::db::{ArticleRepository, DocumentRepository, MediaRepository};
use async_trait::async_trait;
use chrono::Utc;
use quire_core::models::{
    Article, ArticleInput, ArticleSummary, Document, Media, MediaStatus, MediaType,
};
use quire_core::AppError;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemoryDocumentRepository {
    documents: Arc<RwLock<HashMap<String, Document>>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(docs: &mut [Document]) {
    docs.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, AppError> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn exists(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.documents.read().await.contains_key(id))
    }

    async fn insert(&self, document: &Document) -> Result<(), AppError> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&document.id) {
            return Err(AppError::InvalidInput(format!(
                "Document {} already exists",
                document.id
            )));
        }
        documents.insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn save(&self, document: &Document) -> Result<(), AppError> {
        let mut documents = self.documents.write().await;
        if let Some(existing) = documents.get_mut(&document.id) {
            *existing = document.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.documents.write().await.remove(id).is_some())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Document>, AppError> {
        let mut docs: Vec<Document> = self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect();
        newest_first(&mut docs);
        Ok(docs)
    }

    async fn list_published(&self, offset: i64, limit: i64) -> Result<Vec<Document>, AppError> {
        let mut docs: Vec<Document> = self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.is_public)
            .cloned()
            .collect();
        newest_first(&mut docs);
        Ok(docs
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_published(&self) -> Result<i64, AppError> {
        Ok(self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.is_public)
            .count() as i64)
    }

    async fn reassign_owner(&self, from: &str, to: &str) -> Result<u64, AppError> {
        let now = Utc::now();
        let mut moved = 0;
        for doc in self.documents.write().await.values_mut() {
            if doc.owner_id == from {
                doc.owner_id = to.to_string();
                doc.touch(now);
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[derive(Default)]
struct ArticleTable {
    next_id: i64,
    rows: BTreeMap<i64, Article>,
}

#[derive(Clone, Default)]
pub struct InMemoryArticleRepository {
    table: Arc<RwLock<ArticleTable>>,
}

impl InMemoryArticleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleRepository for InMemoryArticleRepository {
    async fn create(&self, input: &ArticleInput) -> Result<Article, AppError> {
        let mut table = self.table.write().await;
        table.next_id += 1;
        let now = Utc::now();
        let article = Article {
            id: table.next_id,
            user_id: input.user_id,
            title: input.title.clone(),
            content: input.content.clone(),
            status: input.status,
            tags: input.tags.clone(),
            author: input.author.clone(),
            excerpt: input.excerpt.clone(),
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(article.id, article.clone());
        Ok(article)
    }

    async fn update(&self, id: i64, input: &ArticleInput) -> Result<Option<Article>, AppError> {
        let mut table = self.table.write().await;
        let Some(article) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        article.user_id = input.user_id;
        article.title = input.title.clone();
        article.content = input.content.clone();
        article.status = input.status;
        article.tags = input.tags.clone();
        article.author = input.author.clone();
        article.excerpt = input.excerpt.clone();
        article.updated_at = Utc::now();
        Ok(Some(article.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, AppError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<ArticleSummary>, AppError> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .map(ArticleSummary::from)
            .collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.table.read().await.rows.len() as i64)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryMediaRepository {
    media: Arc<RwLock<HashMap<Uuid, Media>>>,
}

impl InMemoryMediaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn ready_of(media: &HashMap<Uuid, Media>, media_type: MediaType) -> Vec<Media> {
        let mut items: Vec<Media> = media
            .values()
            .filter(|m| m.media_type == media_type && m.status == MediaStatus::Ready)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        items
    }
}

#[async_trait]
impl MediaRepository for InMemoryMediaRepository {
    async fn create(&self, media: &Media) -> Result<(), AppError> {
        self.media.write().await.insert(media.id, media.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Media>, AppError> {
        Ok(self.media.read().await.get(&id).cloned())
    }

    async fn list_ready(
        &self,
        media_type: MediaType,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Media>, AppError> {
        let media = self.media.read().await;
        Ok(Self::ready_of(&media, media_type)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_ready(&self, media_type: MediaType) -> Result<i64, AppError> {
        let media = self.media.read().await;
        Ok(Self::ready_of(&media, media_type).len() as i64)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.media.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quire_core::models::ArticleStatus;

    fn input(title: &str) -> ArticleInput {
        ArticleInput {
            user_id: 1,
            title: title.to_string(),
            content: "body".to_string(),
            status: ArticleStatus::Draft,
            tags: String::new(),
            author: "ann".to_string(),
            excerpt: String::new(),
        }
    }

    #[tokio::test]
    async fn test_published_documents_newest_first() {
        let repo = InMemoryDocumentRepository::new();
        let base = Utc::now();
        for (i, public) in [true, false, true, true].into_iter().enumerate() {
            let mut doc = Document::new_empty("owner", base);
            doc.is_public = public;
            doc.updated_at = base + Duration::seconds(i as i64);
            repo.insert(&doc).await.unwrap();
        }

        assert_eq!(repo.count_published().await.unwrap(), 3);
        let page = repo.list_published(0, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert!(page[0].updated_at > page[1].updated_at);
        let rest = repo.list_published(2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
    }

    #[tokio::test]
    async fn test_equal_timestamps_page_in_id_order() {
        let repo = InMemoryDocumentRepository::new();
        let now = Utc::now();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let mut doc = Document::new_empty("owner", now);
            doc.is_public = true;
            repo.insert(&doc).await.unwrap();
            ids.push(doc.id);
        }
        ids.sort();

        let mut paged = Vec::new();
        for offset in [0, 2, 4] {
            let page = repo.list_published(offset, 2).await.unwrap();
            paged.extend(page.into_iter().map(|d| d.id));
        }
        assert_eq!(paged, ids);
    }

    #[tokio::test]
    async fn test_reassign_owner_counts_and_moves() {
        let repo = InMemoryDocumentRepository::new();
        let now = Utc::now();
        for owner in ["v1", "v1", "other"] {
            repo.insert(&Document::new_empty(owner, now)).await.unwrap();
        }

        assert_eq!(repo.reassign_owner("v1", "real").await.unwrap(), 2);
        assert!(repo.list_by_owner("v1").await.unwrap().is_empty());
        assert_eq!(repo.list_by_owner("real").await.unwrap().len(), 2);
        assert_eq!(repo.reassign_owner("v1", "real").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_articles_get_increasing_ids() {
        let repo = InMemoryArticleRepository::new();
        let a = repo.create(&input("a")).await.unwrap();
        let b = repo.create(&input("b")).await.unwrap();
        assert!(b.id > a.id);

        let listed = repo.list(0, 10).await.unwrap();
        let ids: Vec<i64> = listed.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);

        assert!(repo.update(99, &input("x")).await.unwrap().is_none());
        assert!(repo.delete(a.id).await.unwrap());
        assert!(!repo.delete(a.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
