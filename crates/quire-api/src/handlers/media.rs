//! Authenticated media endpoints: uploads, delete and signed download URLs.

use crate::auth::Caller;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::PresignedUrl;
use crate::state::AppState;
use crate::utils::upload::extract_media_upload;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    Json,
};
use quire_core::models::{Media, MediaType};
use quire_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaUploadResponse {
    pub id: Uuid,
    pub url: String,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub media_type: MediaType,
    pub category: String,
    pub message: String,
}

impl From<Media> for MediaUploadResponse {
    fn from(m: Media) -> Self {
        MediaUploadResponse {
            id: m.id,
            url: m.file_url,
            file_name: m.file_name,
            file_size: m.file_size,
            content_type: m.content_type,
            media_type: m.media_type,
            category: m.category,
            message: "Media upload successful".to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoUploadResponse {
    pub id: Uuid,
    pub url: String,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub category: String,
    pub preview: Option<String>,
    pub thumbnail: Option<String>,
    pub message: String,
}

impl From<Media> for VideoUploadResponse {
    fn from(m: Media) -> Self {
        VideoUploadResponse {
            id: m.id,
            url: m.file_url,
            file_name: m.file_name,
            file_size: m.file_size,
            content_type: m.content_type,
            category: m.category,
            preview: m.preview,
            thumbnail: m.thumbnail,
            message: "Video upload successful".to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AudioUploadResponse {
    pub id: Uuid,
    pub url: String,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub message: String,
}

impl From<Media> for AudioUploadResponse {
    fn from(m: Media) -> Self {
        AudioUploadResponse {
            id: m.id,
            url: m.file_url,
            file_name: m.file_name,
            file_size: m.file_size,
            content_type: m.content_type,
            message: "Audio upload successful".to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteMediaResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PresignQuery {
    /// Lifetime in seconds (default 3600, at most seven days)
    pub ttl: Option<String>,
}

fn media_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Media not found".to_string()))
}

#[utoipa::path(
    post,
    path = "/media/upload",
    tag = "media",
    request_body(
        content_type = "multipart/form-data",
        description = "`file` of any type plus optional `title`, `description`, `category`"
    ),
    responses(
        (status = 200, description = "File stored", body = MediaUploadResponse),
        (status = 400, description = "No file in the form", body = ErrorResponse),
        (status = 401, description = "No caller identity", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, caller, multipart),
    fields(caller = %caller.subject(), operation = "upload_media")
)]
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let upload = extract_media_upload(multipart).await?;
    let media = state.media.upload_media(caller.subject(), upload).await?;
    Ok(Json(MediaUploadResponse::from(media)))
}

#[utoipa::path(
    post,
    path = "/media/video",
    tag = "media",
    request_body(
        content_type = "multipart/form-data",
        description = "`file` plus optional `title`, `description`, `category`"
    ),
    responses(
        (status = 200, description = "Video stored", body = VideoUploadResponse),
        (status = 400, description = "File is not a video", body = ErrorResponse),
        (status = 401, description = "No caller identity", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, caller, multipart),
    fields(caller = %caller.subject(), operation = "upload_video")
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let upload = extract_media_upload(multipart).await?;
    let media = state.media.upload_video(caller.subject(), upload).await?;
    Ok(Json(VideoUploadResponse::from(media)))
}

#[utoipa::path(
    post,
    path = "/media/audio",
    tag = "media",
    request_body(
        content_type = "multipart/form-data",
        description = "`file` plus optional `title`, `description`"
    ),
    responses(
        (status = 200, description = "Audio stored", body = AudioUploadResponse),
        (status = 400, description = "File is not an audio", body = ErrorResponse),
        (status = 401, description = "No caller identity", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, caller, multipart),
    fields(caller = %caller.subject(), operation = "upload_audio")
)]
pub async fn upload_audio(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let upload = extract_media_upload(multipart).await?;
    let media = state.media.upload_audio(caller.subject(), upload).await?;
    Ok(Json(AudioUploadResponse::from(media)))
}

#[utoipa::path(
    delete,
    path = "/media/{id}",
    tag = "media",
    params(("id" = Uuid, Path, description = "Media ID")),
    responses(
        (status = 200, description = "Media deleted", body = DeleteMediaResponse),
        (status = 403, description = "Caller is not the uploader", body = ErrorResponse),
        (status = 404, description = "Media not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, caller),
    fields(media_id = %id, caller = %caller.subject(), operation = "delete_media")
)]
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.media.delete(media_id(&id)?, caller.subject()).await?;
    Ok(Json(DeleteMediaResponse {
        success: true,
        message: "Media deleted successfully".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/media/{id}/url",
    tag = "media",
    params(("id" = Uuid, Path, description = "Media ID"), PresignQuery),
    responses(
        (status = 200, description = "Temporary download URL", body = PresignedUrl),
        (status = 400, description = "Invalid ttl", body = ErrorResponse),
        (status = 404, description = "Media not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _caller), fields(media_id = %id, operation = "presign_media"))]
pub async fn presign_media_url(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    Path(id): Path<String>,
    Query(query): Query<PresignQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let ttl = query
        .ttl
        .as_deref()
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|_| AppError::InvalidInput("Invalid ttl".to_string()))
        })
        .transpose()?;
    Ok(Json(state.media.presigned_url(media_id(&id)?, ttl).await?))
}
