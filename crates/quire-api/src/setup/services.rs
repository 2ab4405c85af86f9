//! Service initialization and application state setup

use crate::services::{
    ArticleService, CloudinarySigner, DocumentService, FfmpegFrameExtractor, FrameExtractor,
    MediaService, OwnerMigrationService,
};
use crate::state::{AppState, HealthProbe};
use quire_core::Config;
use quire_db::{
    ArticleRepository, DocumentRepository, MediaRepository, PostgresArticleRepository,
    PostgresDocumentRepository, PostgresMediaRepository,
};
use quire_storage::Storage;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;

/// The record stores every service is built on.
#[derive(Clone)]
pub struct Repositories {
    pub documents: Arc<dyn DocumentRepository>,
    pub articles: Arc<dyn ArticleRepository>,
    pub media: Arc<dyn MediaRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            documents: Arc::new(PostgresDocumentRepository::new(pool.clone())),
            articles: Arc::new(PostgresArticleRepository::new(pool.clone())),
            media: Arc::new(PostgresMediaRepository::new(pool)),
        }
    }
}

/// Initialize all services with the ffmpeg frame extractor
pub fn initialize_services(
    config: &Config,
    repositories: Repositories,
    storage: Arc<dyn Storage>,
) -> Arc<AppState> {
    let frames: Arc<dyn FrameExtractor> = Arc::new(FfmpegFrameExtractor::new(config.ffmpeg_path()));
    tracing::info!(ffmpeg_path = %config.ffmpeg_path(), "Frame extractor configured");
    build_state(config, repositories, storage, frames)
}

/// Wire services from explicit collaborators.
pub fn build_state(
    config: &Config,
    repositories: Repositories,
    storage: Arc<dyn Storage>,
    frames: Arc<dyn FrameExtractor>,
) -> Arc<AppState> {
    if config.cloudinary_api_secret().is_empty() {
        tracing::warn!(
            "CLOUDINARY_API_SECRET is empty; Cloudinary will reject upload signatures"
        );
    }

    Arc::new(AppState {
        documents: DocumentService::new(repositories.documents.clone()),
        articles: ArticleService::new(repositories.articles),
        media: MediaService::new(repositories.media, storage, frames),
        migration: OwnerMigrationService::new(repositories.documents.clone()),
        cloudinary: CloudinarySigner::new(config.cloudinary_api_secret()),
        health: HealthProbe::new(repositories.documents),
        started_at: Instant::now(),
    })
}
