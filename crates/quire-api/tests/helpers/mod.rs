#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use quire_api::services::{FrameExtractor, FrameSize};
use quire_api::setup::{build_state, routes::setup_routes, Repositories};
use quire_core::config::{BaseConfig, ServiceConfig};
use quire_core::{Config, StorageBackend};
use quire_db::{InMemoryArticleRepository, InMemoryDocumentRepository, InMemoryMediaRepository};
use quire_storage::LocalStorage;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const CLOUDINARY_SECRET: &str = "abcd";
pub const MEDIA_BASE_URL: &str = "http://localhost:8000/media";

/// Writes a fixed JPEG payload instead of running ffmpeg.
pub struct StubFrameExtractor;

#[async_trait]
impl FrameExtractor for StubFrameExtractor {
    async fn extract_frame(
        &self,
        _video_path: &Path,
        _timestamp: &str,
        output_path: &Path,
        _size: FrameSize,
    ) -> anyhow::Result<()> {
        tokio::fs::write(output_path, b"\xFF\xD8\xFFjpeg").await?;
        Ok(())
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub documents: Arc<InMemoryDocumentRepository>,
    pub media: Arc<InMemoryMediaRepository>,
    pub storage_dir: TempDir,
}

pub fn test_config(storage_path: &Path) -> Config {
    Config(Box::new(ServiceConfig {
        base: BaseConfig {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            cors_origins: vec!["http://localhost:3030".to_string()],
            db_max_connections: 1,
            db_timeout_seconds: 1,
            environment: "test".to_string(),
            log_format: "pretty".to_string(),
            http_concurrency_limit: 8,
        },
        database_url: "postgres://unused@localhost/quire".to_string(),
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        s3_public_url: None,
        local_storage_path: Some(storage_path.display().to_string()),
        local_storage_base_url: Some(MEDIA_BASE_URL.to_string()),
        ffmpeg_path: "ffmpeg".to_string(),
        max_upload_size_bytes: 10 * 1024 * 1024,
        cloudinary_api_secret: CLOUDINARY_SECRET.to_string(),
    }))
}

pub async fn spawn_app() -> TestApp {
    let storage_dir = tempfile::tempdir().unwrap();
    let config = test_config(storage_dir.path());

    let documents = Arc::new(InMemoryDocumentRepository::new());
    let media = Arc::new(InMemoryMediaRepository::new());
    let repositories = Repositories {
        documents: documents.clone(),
        articles: Arc::new(InMemoryArticleRepository::new()),
        media: media.clone(),
    };
    let storage = Arc::new(
        LocalStorage::new(storage_dir.path(), MEDIA_BASE_URL.to_string())
            .await
            .unwrap(),
    );

    let state = build_state(&config, repositories, storage, Arc::new(StubFrameExtractor));
    let router = setup_routes(&config, state).unwrap();

    TestApp {
        server: TestServer::new(router).unwrap(),
        documents,
        media,
        storage_dir,
    }
}

/// Attach an `X-Virtual-User-ID` header.
pub fn as_user(request: TestRequest, user: &str) -> TestRequest {
    request.add_header(
        HeaderName::from_static("x-virtual-user-id"),
        HeaderValue::from_str(user).unwrap(),
    )
}

/// Attach an unsigned bearer token carrying `claims`.
pub fn with_bearer(request: TestRequest, claims: serde_json::Value) -> TestRequest {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    request.add_header(
        axum::http::header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}.{}.sig", header, payload)).unwrap(),
    )
}
