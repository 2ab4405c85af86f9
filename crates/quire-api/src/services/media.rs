//! Media service: video and audio uploads, frame capture, deletion and the
//! public media catalogue.

use crate::auth::authorize;
use crate::error::storage_error;
use crate::services::frames::{FrameExtractor, FrameSize};
use anyhow::Context;
use bytes::Bytes;
use chrono::Utc;
use quire_core::models::{
    infer_content_type, AudioDetail, Media, MediaStatus, MediaType, PublicAudioSummary,
    PublicVideoSummary, VideoDetail,
};
use quire_core::pagination::DEFAULT_PUBLISHED_PAGE_SIZE;
use quire_core::{AppError, PageRequest};
use quire_db::MediaRepository;
use quire_storage::{generate_media_key, Storage};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

/// Offset into the video the preview and thumbnail are taken from.
const FRAME_TIMESTAMP: &str = "00:00:01";
const DEFAULT_VIDEO_CATEGORY: &str = "other";
const AUDIO_CATEGORY: &str = "audio";
const AUDIO_CATALOGUE_LIMIT: i64 = 100;

pub const DEFAULT_PRESIGN_TTL_SECS: u64 = 3600;
pub const MAX_PRESIGN_TTL_SECS: u64 = 7 * 24 * 3600;

/// A file received from a multipart upload plus its form fields.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl MediaUpload {
    /// Declared content type, or one guessed from the file name.
    fn resolved_content_type(&self) -> String {
        self.content_type
            .clone()
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
            .unwrap_or_else(|| infer_content_type(&self.file_name).to_string())
    }

    fn title(&self) -> String {
        self.title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.file_name.clone())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrl {
    pub url: String,
    pub expires_in: u64,
}

#[derive(Clone)]
pub struct MediaService {
    repository: Arc<dyn MediaRepository>,
    storage: Arc<dyn Storage>,
    frames: Arc<dyn FrameExtractor>,
}

impl MediaService {
    pub fn new(
        repository: Arc<dyn MediaRepository>,
        storage: Arc<dyn Storage>,
        frames: Arc<dyn FrameExtractor>,
    ) -> Self {
        Self {
            repository,
            storage,
            frames,
        }
    }

    /// Store any file as-is. The media kind follows the content type, no
    /// frames are captured and the category defaults to the kind.
    #[tracing::instrument(
        skip(self, upload),
        fields(file_name = %upload.file_name, size = upload.data.len())
    )]
    pub async fn upload_media(
        &self,
        uploader_id: &str,
        upload: MediaUpload,
    ) -> Result<Media, AppError> {
        let content_type = upload.resolved_content_type();
        let mut media = self.new_record(uploader_id, &upload, content_type);
        media.category = upload
            .category
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| media.media_type.key_prefix().to_string());

        self.store_blob(&mut media, upload.data.clone()).await?;
        self.persist(&media).await?;
        tracing::info!(
            media_id = %media.id,
            media_type = %media.media_type,
            "Media upload successful"
        );
        Ok(media)
    }

    /// Store a video, capture its preview and thumbnail frames, and record it as ready.
    ///
    /// Frame capture failures are logged and leave `preview` / `thumbnail` empty.
    #[tracing::instrument(
        skip(self, upload),
        fields(file_name = %upload.file_name, size = upload.data.len())
    )]
    pub async fn upload_video(
        &self,
        uploader_id: &str,
        upload: MediaUpload,
    ) -> Result<Media, AppError> {
        let content_type = upload.resolved_content_type();
        if !content_type.contains("video") {
            return Err(AppError::InvalidInput("File is not a video".to_string()));
        }

        let mut media = self.new_record(uploader_id, &upload, content_type);
        self.store_blob(&mut media, upload.data.clone()).await?;
        let (preview, thumbnail) = self.capture_frames(&upload.file_name, &upload.data).await;

        media.media_type = MediaType::Video;
        media.category = upload
            .category
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_VIDEO_CATEGORY.to_string());
        media.preview = preview;
        media.thumbnail = thumbnail;

        self.persist(&media).await?;
        tracing::info!(media_id = %media.id, "Video upload successful");
        Ok(media)
    }

    #[tracing::instrument(
        skip(self, upload),
        fields(file_name = %upload.file_name, size = upload.data.len())
    )]
    pub async fn upload_audio(
        &self,
        uploader_id: &str,
        upload: MediaUpload,
    ) -> Result<Media, AppError> {
        let content_type = upload.resolved_content_type();
        if !content_type.contains("audio") {
            return Err(AppError::InvalidInput("File is not an audio".to_string()));
        }

        let mut media = self.new_record(uploader_id, &upload, content_type);
        self.store_blob(&mut media, upload.data.clone()).await?;
        media.media_type = MediaType::Audio;
        media.category = AUDIO_CATEGORY.to_string();

        self.persist(&media).await?;
        tracing::info!(media_id = %media.id, "Audio upload successful");
        Ok(media)
    }

    /// Delete a media record owned by `caller`, then its blobs.
    ///
    /// The record delete is authoritative. Blob deletion afterwards is
    /// best-effort: failures are logged and the call still succeeds.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: Uuid, caller: &str) -> Result<(), AppError> {
        let media = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Media not found".to_string()))?;

        if !authorize(&media.uploader_id, caller).is_allowed() {
            tracing::warn!(
                media_id = %id,
                caller = %caller,
                "Media delete denied: caller is not the uploader"
            );
            return Err(AppError::Forbidden(
                "No permission to delete this media".to_string(),
            ));
        }

        if !self.repository.delete(id).await? {
            return Err(AppError::NotFound("Media not found".to_string()));
        }

        for key in media.blob_keys(self.storage.public_base_url()) {
            if let Err(e) = self.storage.delete(&key).await {
                tracing::error!(
                    error = %e,
                    media_id = %id,
                    key = %key,
                    "Failed to delete blob after media record delete"
                );
            }
        }

        Ok(())
    }

    /// Temporary download URL for the media file. `ttl_secs` defaults to one
    /// hour and is capped at seven days.
    pub async fn presigned_url(
        &self,
        id: Uuid,
        ttl_secs: Option<u64>,
    ) -> Result<PresignedUrl, AppError> {
        let media = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Media not found".to_string()))?;

        let ttl = ttl_secs
            .unwrap_or(DEFAULT_PRESIGN_TTL_SECS)
            .clamp(1, MAX_PRESIGN_TTL_SECS);
        let url = self
            .storage
            .presign_get(&media.file_key, Duration::from_secs(ttl))
            .await
            .map_err(storage_error)?;

        Ok(PresignedUrl {
            url,
            expires_in: ttl,
        })
    }

    /// Ready videos, newest first. An out-of-range `limit` falls back to 20.
    pub async fn list_public_videos(
        &self,
        page: i64,
        limit: i64,
    ) -> Result<Vec<PublicVideoSummary>, AppError> {
        let request = PageRequest::or_default(page, limit, DEFAULT_PUBLISHED_PAGE_SIZE);
        let videos = self
            .repository
            .list_ready(MediaType::Video, request.offset(), request.limit())
            .await?;
        Ok(videos.into_iter().map(PublicVideoSummary::from).collect())
    }

    pub async fn public_video(&self, id: Uuid) -> Result<VideoDetail, AppError> {
        let media = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
        if media.media_type != MediaType::Video {
            return Err(AppError::InvalidInput("Media is not a video".to_string()));
        }
        Ok(VideoDetail::from(media))
    }

    /// The newest 100 ready audio files.
    pub async fn list_public_audio(&self) -> Result<Vec<PublicAudioSummary>, AppError> {
        let audio = self
            .repository
            .list_ready(MediaType::Audio, 0, AUDIO_CATALOGUE_LIMIT)
            .await?;
        Ok(audio.into_iter().map(PublicAudioSummary::from).collect())
    }

    pub async fn public_audio(&self, id: Uuid) -> Result<AudioDetail, AppError> {
        let media = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Audio not found".to_string()))?;
        if media.media_type != MediaType::Audio {
            return Err(AppError::InvalidInput("Media is not an audio".to_string()));
        }
        Ok(AudioDetail::from(media))
    }

    /// Write the file under the record's key and keep the URL the backend returns.
    async fn store_blob(&self, media: &mut Media, data: Bytes) -> Result<(), AppError> {
        media.file_url = self
            .storage
            .put(&media.file_key, data, &media.content_type)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    fn new_record(&self, uploader_id: &str, upload: &MediaUpload, content_type: String) -> Media {
        let now = Utc::now();
        Media {
            id: Uuid::new_v4(),
            uploader_id: uploader_id.to_string(),
            title: upload.title(),
            description: upload.description.clone().filter(|d| !d.is_empty()),
            file_name: upload.file_name.clone(),
            file_key: generate_media_key(&content_type, &upload.file_name),
            file_url: String::new(),
            file_size: upload.data.len() as i64,
            media_type: MediaType::from_content_type(&content_type),
            content_type,
            status: MediaStatus::Ready,
            thumbnail: None,
            preview: None,
            meta: None,
            category: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Insert the record; on failure the blobs just written are removed again.
    async fn persist(&self, media: &Media) -> Result<(), AppError> {
        let Err(e) = self.repository.create(media).await else {
            return Ok(());
        };

        tracing::error!(error = %e, media_id = %media.id, "Failed to save media record");
        for key in media.blob_keys(self.storage.public_base_url()) {
            if let Err(cleanup) = self.storage.delete(&key).await {
                tracing::warn!(
                    error = %cleanup,
                    key = %key,
                    "Failed to remove blob of unsaved media"
                );
            }
        }
        Err(e)
    }

    /// Preview and thumbnail URLs; `None` for any frame that could not be produced.
    async fn capture_frames(
        &self,
        file_name: &str,
        data: &Bytes,
    ) -> (Option<String>, Option<String>) {
        match self.try_capture_frames(file_name, data).await {
            Ok(frames) => frames,
            Err(e) => {
                tracing::warn!(error = %e, file_name = %file_name, "Frame capture skipped");
                (None, None)
            }
        }
    }

    async fn try_capture_frames(
        &self,
        file_name: &str,
        data: &Bytes,
    ) -> anyhow::Result<(Option<String>, Option<String>)> {
        let workdir = tempfile::Builder::new()
            .prefix("quire-video-")
            .tempdir()
            .context("Failed to create temp dir for frame capture")?;

        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let video_path = workdir
            .path()
            .join(format!("video_{}{}", Uuid::new_v4(), extension));
        tokio::fs::write(&video_path, data)
            .await
            .context("Failed to write video to temp file")?;

        let base = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("video");

        let dir = workdir.path();
        let preview_name = format!("preview_{}.jpg", base);
        let preview = self
            .capture_frame(dir, &video_path, &preview_name, FrameSize::PREVIEW)
            .await;
        let thumbnail_name = format!("thumbnail_{}.jpg", base);
        let thumbnail = self
            .capture_frame(dir, &video_path, &thumbnail_name, FrameSize::THUMBNAIL)
            .await;

        Ok((preview, thumbnail))
    }

    async fn capture_frame(
        &self,
        workdir: &Path,
        video_path: &Path,
        frame_name: &str,
        size: FrameSize,
    ) -> Option<String> {
        let output = workdir.join(format!("frame_{}x{}.jpg", size.width, size.height));

        if let Err(e) = self
            .frames
            .extract_frame(video_path, FRAME_TIMESTAMP, &output, size)
            .await
        {
            tracing::warn!(error = %e, frame = %frame_name, "Frame extraction failed");
            return None;
        }

        let bytes = match tokio::fs::read(&output).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, frame = %frame_name, "Extracted frame missing");
                return None;
            }
        };

        let key = generate_media_key("image/jpeg", frame_name);
        let stored = self.storage.put(&key, bytes.into(), "image/jpeg").await;
        match stored {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Frame upload failed");
                None
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quire_core::StorageBackend;
    use quire_db::InMemoryMediaRepository;
    use quire_storage::{LocalStorage, StorageError, StorageResult};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    const BASE_URL: &str = "http://localhost:8000/media";

    struct StubFrames {
        fail: bool,
    }

    #[async_trait]
    impl FrameExtractor for StubFrames {
        async fn extract_frame(
            &self,
            _video_path: &Path,
            _timestamp: &str,
            output_path: &Path,
            _size: FrameSize,
        ) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("no decoder");
            }
            tokio::fs::write(output_path, b"jpeg").await?;
            Ok(())
        }
    }

    /// Local storage whose deletes start failing once `fail_deletes` is set.
    struct FailingDeleteStorage {
        inner: LocalStorage,
        fail_deletes: AtomicBool,
    }

    #[async_trait]
    impl Storage for FailingDeleteStorage {
        async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String> {
            self.inner.put(key, data, content_type).await
        }

        async fn delete(&self, key: &str) -> StorageResult<()> {
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(StorageError::DeleteFailed(format!("{} is read-only", key)));
            }
            self.inner.delete(key).await
        }

        async fn exists(&self, key: &str) -> StorageResult<bool> {
            self.inner.exists(key).await
        }

        async fn presign_get(&self, key: &str, ttl: Duration) -> StorageResult<String> {
            self.inner.presign_get(key, ttl).await
        }

        fn public_base_url(&self) -> &str {
            self.inner.public_base_url()
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::Local
        }
    }

    /// Repository whose inserts always fail.
    struct RejectingRepository;

    #[async_trait]
    impl MediaRepository for RejectingRepository {
        async fn create(&self, _media: &Media) -> Result<(), AppError> {
            Err(AppError::Internal("insert rejected".to_string()))
        }

        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Media>, AppError> {
            Ok(None)
        }

        async fn list_ready(
            &self,
            _media_type: MediaType,
            _offset: i64,
            _limit: i64,
        ) -> Result<Vec<Media>, AppError> {
            Ok(Vec::new())
        }

        async fn count_ready(&self, _media_type: MediaType) -> Result<i64, AppError> {
            Ok(0)
        }

        async fn delete(&self, _id: Uuid) -> Result<bool, AppError> {
            Ok(false)
        }
    }

    async fn local_storage(dir: &TempDir) -> LocalStorage {
        LocalStorage::new(dir.path(), BASE_URL.to_string())
            .await
            .unwrap()
    }

    async fn service(fail_frames: bool) -> (MediaService, Arc<LocalStorage>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(local_storage(&dir).await);
        let svc = MediaService::new(
            Arc::new(InMemoryMediaRepository::new()),
            storage.clone(),
            Arc::new(StubFrames { fail: fail_frames }),
        );
        (svc, storage, dir)
    }

    fn upload(file_name: &str, content_type: Option<&str>) -> MediaUpload {
        MediaUpload {
            file_name: file_name.to_string(),
            content_type: content_type.map(String::from),
            data: Bytes::from_static(b"media-bytes"),
            title: None,
            description: None,
            category: None,
        }
    }

    fn mp4() -> MediaUpload {
        upload("clip.mp4", Some("video/mp4"))
    }

    fn song() -> MediaUpload {
        upload("song.mp3", None)
    }

    fn png() -> MediaUpload {
        upload("cover.png", None)
    }

    /// Files left under `dir`, at any depth.
    fn stored_files(dir: &Path) -> usize {
        let mut count = 0;
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                count += stored_files(&path);
            } else {
                count += 1;
            }
        }
        count
    }

    #[tokio::test]
    async fn test_video_upload_stores_blob_and_frames() {
        let (svc, storage, _dir) = service(false).await;
        let media = svc.upload_video("u1", mp4()).await.unwrap();

        assert_eq!(media.title, "clip.mp4");
        assert_eq!(media.category, "other");
        assert_eq!(media.status, MediaStatus::Ready);
        assert_eq!(media.media_type, MediaType::Video);
        assert_eq!(media.file_size, 11);
        assert!(media.file_url.starts_with(BASE_URL));
        assert!(storage.exists(&media.file_key).await.unwrap());

        let preview = media.preview.clone().unwrap();
        let prefix = format!("{}/image/preview_clip-", BASE_URL);
        assert!(preview.starts_with(&prefix));
        let thumbnail = media.thumbnail.clone().unwrap();
        assert!(thumbnail.contains("/image/thumbnail_clip-"));
    }

    #[tokio::test]
    async fn test_frame_failure_is_not_fatal() {
        let (svc, _, _dir) = service(true).await;
        let media = svc.upload_video("u1", mp4()).await.unwrap();
        assert!(media.preview.is_none());
        assert!(media.thumbnail.is_none());
    }

    #[tokio::test]
    async fn test_content_type_checks() {
        let (svc, _, _dir) = service(false).await;
        let mp3 = upload("a.mp3", None);
        let err = svc.upload_video("u1", mp3).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: File is not a video");

        let err = svc.upload_audio("u1", mp4()).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: File is not an audio");

        let audio = svc.upload_audio("u1", song()).await.unwrap();
        assert_eq!(audio.content_type, "audio/mpeg");
        assert_eq!(audio.category, "audio");
        assert!(audio.preview.is_none());
    }

    #[tokio::test]
    async fn test_generic_upload_keeps_any_content_type() {
        let (svc, storage, _dir) = service(false).await;

        let image = svc.upload_media("u1", png()).await.unwrap();
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.media_type, MediaType::Image);
        assert_eq!(image.category, "image");
        assert!(image.file_key.starts_with("image/cover-"));
        assert!(image.preview.is_none());
        assert!(storage.exists(&image.file_key).await.unwrap());

        let mut notes = upload("notes.bin", Some("application/x-custom"));
        notes.category = Some("attachments".to_string());
        let other = svc.upload_media("u1", notes).await.unwrap();
        assert_eq!(other.media_type, MediaType::Other);
        assert_eq!(other.category, "attachments");
        assert!(other.file_key.starts_with("other/notes-"));

        // generic uploads of an audio file still surface in the audio catalogue
        let song = upload("song.ogg", Some("audio/ogg"));
        svc.upload_media("u1", song).await.unwrap();
        assert_eq!(svc.list_public_audio().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_checks_uploader_and_removes_blobs() {
        let (svc, storage, _dir) = service(false).await;
        let media = svc.upload_video("u1", mp4()).await.unwrap();

        let err = svc.delete(media.id, "u2").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(storage.exists(&media.file_key).await.unwrap());

        svc.delete(media.id, "u1").await.unwrap();
        for key in media.blob_keys(storage.public_base_url()) {
            assert!(!storage.exists(&key).await.unwrap());
        }
        let err = svc.delete(media.id, "u1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_succeeds_when_blob_removal_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FailingDeleteStorage {
            inner: local_storage(&dir).await,
            fail_deletes: AtomicBool::new(false),
        });
        let repository = Arc::new(InMemoryMediaRepository::new());
        let svc = MediaService::new(
            repository.clone(),
            storage.clone(),
            Arc::new(StubFrames { fail: false }),
        );
        let media = svc.upload_video("u1", mp4()).await.unwrap();

        storage.fail_deletes.store(true, Ordering::SeqCst);
        svc.delete(media.id, "u1").await.unwrap();

        assert!(repository.find_by_id(media.id).await.unwrap().is_none());
        // the record is gone; the blob is left behind
        assert!(storage.exists(&media.file_key).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_insert_removes_stored_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let svc = MediaService::new(
            Arc::new(RejectingRepository),
            Arc::new(local_storage(&dir).await),
            Arc::new(StubFrames { fail: false }),
        );

        let err = svc.upload_video("u1", mp4()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        let err = svc.upload_audio("u1", song()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        let err = svc.upload_media("u1", png()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));

        // file, preview and thumbnail were all written, then removed again
        assert_eq!(stored_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_public_detail_checks_kind() {
        let (svc, _, _dir) = service(false).await;
        let audio = svc.upload_audio("u1", song()).await.unwrap();

        let err = svc.public_video(audio.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(svc.public_audio(audio.id).await.unwrap().title, "song.mp3");
        let err = svc.public_audio(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(svc.list_public_audio().await.unwrap().len(), 1);
        assert!(svc.list_public_videos(1, 500).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_presigned_url_ttl_is_capped() {
        let (svc, _, _dir) = service(false).await;
        let media = svc.upload_audio("u1", song()).await.unwrap();

        let default = svc.presigned_url(media.id, None).await.unwrap();
        assert_eq!(default.expires_in, 3600);
        assert_eq!(default.url, media.file_url);

        let capped = svc.presigned_url(media.id, Some(u64::MAX)).await.unwrap();
        assert_eq!(capped.expires_in, MAX_PRESIGN_TTL_SECS);
    }
}
