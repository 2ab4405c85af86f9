//! Document entity service: creation, sparse updates, publish state and
//! the public listing.

use crate::auth::{authorize, Authorization};
use chrono::Utc;
use quire_core::models::{Document, DocumentPatch, DocumentSummary, PublicDocumentSummary};
use quire_core::pagination::Page;
use quire_core::{AppError, PageRequest};
use quire_db::DocumentRepository;
use std::sync::Arc;

/// Result of an ownership-gated mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome<T> {
    Done(T),
    Forbidden,
    NotFound,
}

impl<T> DocumentOutcome<T> {
    /// Map the gate outcomes onto 403 / 404 errors.
    pub fn into_result(self) -> Result<T, AppError> {
        match self {
            DocumentOutcome::Done(value) => Ok(value),
            DocumentOutcome::Forbidden => Err(AppError::Forbidden(
                "No permission to modify this document".to_string(),
            )),
            DocumentOutcome::NotFound => Err(AppError::NotFound("Document not found".to_string())),
        }
    }
}

#[derive(Clone)]
pub struct DocumentService {
    repository: Arc<dyn DocumentRepository>,
}

impl DocumentService {
    pub fn new(repository: Arc<dyn DocumentRepository>) -> Self {
        Self { repository }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_empty(&self, owner_id: &str) -> Result<Document, AppError> {
        let document = Document::new_empty(owner_id, Utc::now());
        self.repository.insert(&document).await?;
        tracing::info!(document_id = %document.id, "Created empty document");
        Ok(document)
    }

    /// Read by id. Not ownership-gated: any caller can read any document.
    pub async fn get(&self, id: &str) -> Result<Option<Document>, AppError> {
        self.repository.find_by_id(id).await
    }

    pub async fn exists(&self, id: &str) -> Result<bool, AppError> {
        self.repository.exists(id).await
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<DocumentSummary>, AppError> {
        let documents = self.repository.list_by_owner(owner_id).await?;
        Ok(documents.into_iter().map(DocumentSummary::from).collect())
    }

    /// Apply a sparse patch. A document whose owner is still empty may be
    /// updated by anyone; the patch can then claim it through `ownerId`.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: &str,
        caller: &str,
        patch: DocumentPatch,
    ) -> Result<DocumentOutcome<Document>, AppError> {
        let Some(mut document) = self.repository.find_by_id(id).await? else {
            tracing::debug!(document_id = %id, "Update of missing document");
            return Ok(DocumentOutcome::NotFound);
        };

        let claimable = document.owner_id.is_empty();
        if !claimable && !authorize(&document.owner_id, caller).is_allowed() {
            tracing::warn!(
                document_id = %id,
                caller = %caller,
                "Update denied: caller is not the owner"
            );
            return Ok(DocumentOutcome::Forbidden);
        }

        document.apply_patch(patch, Utc::now());
        self.repository.save(&document).await?;
        Ok(DocumentOutcome::Done(document))
    }

    pub async fn publish(
        &self,
        id: &str,
        caller: &str,
    ) -> Result<DocumentOutcome<Document>, AppError> {
        self.set_public(id, caller, true).await
    }

    pub async fn unpublish(
        &self,
        id: &str,
        caller: &str,
    ) -> Result<DocumentOutcome<Document>, AppError> {
        self.set_public(id, caller, false).await
    }

    #[tracing::instrument(skip(self))]
    async fn set_public(
        &self,
        id: &str,
        caller: &str,
        is_public: bool,
    ) -> Result<DocumentOutcome<Document>, AppError> {
        let Some(mut document) = self.repository.find_by_id(id).await? else {
            tracing::debug!(document_id = %id, "Publish state change on missing document");
            return Ok(DocumentOutcome::NotFound);
        };

        if authorize(&document.owner_id, caller) == Authorization::Denied {
            tracing::warn!(
                document_id = %id,
                caller = %caller,
                "Publish state change denied: caller is not the owner"
            );
            return Ok(DocumentOutcome::Forbidden);
        }

        document.is_public = is_public;
        document.touch(Utc::now());
        self.repository.save(&document).await?;
        Ok(DocumentOutcome::Done(document))
    }

    /// Returns `false` both when the document is missing and when the caller
    /// does not own it; the two cases are only told apart in the logs.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str, caller: &str) -> Result<bool, AppError> {
        let Some(document) = self.repository.find_by_id(id).await? else {
            tracing::debug!(document_id = %id, "Delete of missing document");
            return Ok(false);
        };

        if !authorize(&document.owner_id, caller).is_allowed() {
            tracing::warn!(
                document_id = %id,
                caller = %caller,
                "Delete denied: caller is not the owner"
            );
            return Ok(false);
        }

        self.repository.delete(id).await
    }

    /// Public documents, most recently updated first.
    pub async fn list_published(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<Page<PublicDocumentSummary>, AppError> {
        let request = PageRequest::clamped(page, page_size);
        let total = self.repository.count_published().await?;
        let documents = self
            .repository
            .list_published(request.offset(), request.limit())
            .await?;

        let items = documents
            .into_iter()
            .map(PublicDocumentSummary::from)
            .collect();

        Ok(Page {
            items,
            total,
            request,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::models::{ImageRef, Patch};
    use quire_db::InMemoryDocumentRepository;
    use serde_json::json;

    fn service() -> (DocumentService, Arc<InMemoryDocumentRepository>) {
        let repo = Arc::new(InMemoryDocumentRepository::new());
        (DocumentService::new(repo.clone()), repo)
    }

    fn patch(value: serde_json::Value) -> DocumentPatch {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_create_empty_defaults() {
        let (svc, _) = service();
        let doc = svc.create_empty("u1").await.unwrap();
        assert_eq!(doc.title, "Untitled");
        assert_eq!(doc.owner_id, "u1");
        assert!(!doc.is_public);
        assert!(doc.icon_image.is_none());
        assert!(doc.cover_image.is_none());
        assert!(doc.editor_json.is_none());
        assert!(svc.exists(&doc.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_forbidden_and_leaves_document() {
        let (svc, _) = service();
        let doc = svc.create_empty("u1").await.unwrap();

        let retitle = patch(json!({"title": "x"}));
        let outcome = svc.update(&doc.id, "u2", retitle).await.unwrap();
        assert_eq!(outcome, DocumentOutcome::Forbidden);
        assert_eq!(svc.get(&doc.id).await.unwrap().unwrap().title, "Untitled");
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let (svc, _) = service();
        let empty = DocumentPatch::default();
        let outcome = svc.update("nope", "u1", empty).await.unwrap();
        assert_eq!(outcome, DocumentOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_null_clears_image_and_absent_keeps_it() {
        let (svc, _) = service();
        let doc = svc.create_empty("u1").await.unwrap();

        svc.update(
            &doc.id,
            "u1",
            patch(json!({
                "iconImage": {"url": "https://img/i.png", "timeStamp": 12.9},
                "coverImage": {"url": "https://img/c.png"}
            })),
        )
        .await
        .unwrap();
        let stored = svc.get(&doc.id).await.unwrap().unwrap();
        let icon = ImageRef {
            url: "https://img/i.png".to_string(),
            time_stamp: 12,
        };
        assert_eq!(stored.icon_image, Some(icon));
        assert_eq!(stored.cover_image.as_ref().unwrap().time_stamp, 0);

        let clear_icon = patch(json!({"iconImage": null}));
        svc.update(&doc.id, "u1", clear_icon).await.unwrap();
        let stored = svc.get(&doc.id).await.unwrap().unwrap();
        assert!(stored.icon_image.is_none());
        assert!(stored.cover_image.is_some());
    }

    #[tokio::test]
    async fn test_update_always_bumps_updated_at() {
        let (svc, _) = service();
        let doc = svc.create_empty("u1").await.unwrap();

        let updated = svc
            .update(&doc.id, "u1", patch(json!({"unknown": 1})))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert!(updated.updated_at >= doc.updated_at);
        assert!(updated.updated_at >= updated.created_at);
        assert_eq!(updated.title, doc.title);
    }

    #[tokio::test]
    async fn test_empty_owner_can_be_claimed_once() {
        let (svc, repo) = service();
        let orphan = Document::new_empty("", Utc::now());
        repo.insert(&orphan).await.unwrap();

        let claimed = svc
            .update(&orphan.id, "u9", patch(json!({"ownerId": "u9"})))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(claimed.owner_id, "u9");

        // Owner is set now; the owner cannot hand it over through update.
        let again = svc
            .update(&orphan.id, "u9", patch(json!({"ownerId": "u10"})))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(again.owner_id, "u9");
    }

    #[tokio::test]
    async fn test_editor_json_replaced_wholesale() {
        let (svc, _) = service();
        let doc = svc.create_empty("u1").await.unwrap();
        for body in [json!({"a": 1, "b": 2}), json!({"c": 3})] {
            let replace = patch(json!({ "editorJson": body }));
            svc.update(&doc.id, "u1", replace).await.unwrap();
        }
        let stored = svc.get(&doc.id).await.unwrap().unwrap();
        assert_eq!(stored.editor_json, Some(json!({"c": 3})));

        let cleared = DocumentPatch {
            editor_json: Patch::Null,
            ..Default::default()
        };
        svc.update(&doc.id, "u1", cleared).await.unwrap();
        let stored = svc.get(&doc.id).await.unwrap().unwrap();
        assert!(stored.editor_json.is_none());
    }

    #[tokio::test]
    async fn test_publish_is_idempotent_and_gated() {
        let (svc, _) = service();
        let doc = svc.create_empty("u1").await.unwrap();

        for _ in 0..2 {
            let outcome = svc.publish(&doc.id, "u1").await.unwrap();
            assert!(outcome.into_result().unwrap().is_public);
        }
        let outcome = svc.unpublish(&doc.id, "u2").await.unwrap();
        assert_eq!(outcome, DocumentOutcome::Forbidden);
        let outcome = svc.publish("missing", "u1").await.unwrap();
        assert_eq!(outcome, DocumentOutcome::NotFound);

        let outcome = svc.unpublish(&doc.id, "u1").await.unwrap();
        assert!(!outcome.into_result().unwrap().is_public);
    }

    #[tokio::test]
    async fn test_delete_by_wrong_owner_keeps_record() {
        let (svc, _) = service();
        let doc = svc.create_empty("u1").await.unwrap();

        assert!(!svc.delete(&doc.id, "wrong-owner").await.unwrap());
        assert!(svc.get(&doc.id).await.unwrap().is_some());

        assert!(svc.delete(&doc.id, "u1").await.unwrap());
        assert!(svc.get(&doc.id).await.unwrap().is_none());
        assert!(!svc.delete(&doc.id, "u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_published_pages_are_disjoint() {
        let (svc, repo) = service();
        let base = Utc::now();
        for i in 0..25 {
            let mut doc = Document::new_empty("u1", base);
            doc.is_public = true;
            doc.updated_at = base + chrono::Duration::seconds(i);
            repo.insert(&doc).await.unwrap();
        }
        repo.insert(&Document::new_empty("u1", base)).await.unwrap();

        let first = svc.list_published(1, 20).await.unwrap();
        let second = svc.list_published(2, 20).await.unwrap();
        assert_eq!(first.total, 25);
        assert_eq!(first.items.len(), 20);
        assert_eq!(second.items.len(), 5);

        let all: Vec<_> = first.items.iter().chain(second.items.iter()).collect();
        assert!(all.windows(2).all(|w| w[0].updated_at >= w[1].updated_at));
        let ids: std::collections::HashSet<_> = all.iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids.len(), 25);
    }

    #[tokio::test]
    async fn test_list_published_clamps_request() {
        let (svc, _) = service();
        let page = svc.list_published(0, 500).await.unwrap();
        assert_eq!((page.request.page, page.request.page_size), (1, 100));
        let page = svc.list_published(-3, 0).await.unwrap();
        assert_eq!((page.request.page, page.request.page_size), (1, 1));
    }

    #[tokio::test]
    async fn test_list_by_owner_returns_summaries() {
        let (svc, _) = service();
        svc.create_empty("u1").await.unwrap();
        svc.create_empty("u1").await.unwrap();
        svc.create_empty("u2").await.unwrap();
        let mine = svc.list_by_owner("u1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|s| s.title == "Untitled"));
    }
}
