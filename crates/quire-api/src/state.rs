use crate::services::{
    ArticleService, CloudinarySigner, DocumentService, MediaService, OwnerMigrationService,
};
use quire_db::DocumentRepository;
use std::sync::Arc;
use std::time::Instant;

/// Database liveness check used by the readiness probe.
#[derive(Clone)]
pub struct HealthProbe {
    repository: Arc<dyn DocumentRepository>,
}

impl HealthProbe {
    pub fn new(repository: Arc<dyn DocumentRepository>) -> Self {
        Self { repository }
    }

    pub async fn ping(&self) -> Result<(), quire_core::AppError> {
        self.repository.ping().await
    }
}

/// Main application state, built once at startup and shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub documents: DocumentService,
    pub articles: ArticleService,
    pub media: MediaService,
    pub migration: OwnerMigrationService,
    pub cloudinary: CloudinarySigner,
    pub health: HealthProbe,
    pub started_at: Instant,
}

#[allow(dead_code)]
fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    assert_send::<AppState>();
    assert_sync::<AppState>();
}
