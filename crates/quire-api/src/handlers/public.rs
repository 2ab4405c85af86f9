//! Unauthenticated endpoints: the published document feed, the media
//! catalogue and Cloudinary upload signing.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use quire_core::models::{
    AudioDetail, PublicAudioSummary, PublicDocumentSummary, PublicVideoSummary, VideoDetail,
};
use quire_core::pagination::{PageMeta, DEFAULT_PUBLISHED_PAGE_SIZE};
use quire_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// `page` / `limit` as sent by the client. Values that do not parse are
/// treated as missing rather than rejected.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    fn page(&self) -> i64 {
        parse_positive(self.page.as_deref()).unwrap_or(1)
    }

    fn limit(&self) -> i64 {
        parse_positive(self.limit.as_deref()).unwrap_or(DEFAULT_PUBLISHED_PAGE_SIZE)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n >= 1)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PublishedDocumentsResponse {
    pub data: Vec<PublicDocumentSummary>,
    pub meta: PageMeta,
}

#[utoipa::path(
    get,
    path = "/public/documents",
    tag = "public",
    params(PageQuery),
    responses(
        (
            status = 200,
            description = "Published documents, most recently updated first",
            body = PublishedDocumentsResponse
        )
    )
)]
#[tracing::instrument(skip(state), fields(operation = "list_published_documents"))]
pub async fn list_published_documents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let page = state
        .documents
        .list_published(query.page(), query.limit())
        .await?;
    let meta = page.meta();
    Ok(Json(PublishedDocumentsResponse {
        data: page.items,
        meta,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignCloudinaryRequest {
    #[schema(value_type = Object)]
    pub params_to_sign: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignCloudinaryResponse {
    pub signature: String,
}

#[utoipa::path(
    post,
    path = "/public/sign-cloudinary",
    tag = "public",
    request_body = SignCloudinaryRequest,
    responses(
        (status = 200, description = "Upload signature", body = SignCloudinaryResponse),
        (status = 400, description = "Invalid request format", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, body), fields(operation = "sign_cloudinary"))]
pub async fn sign_cloudinary(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SignCloudinaryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let Json(request) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected signing request");
        AppError::InvalidInput("Invalid request format".to_string())
    })?;

    let signature = state.cloudinary.sign(&request.params_to_sign);
    Ok(Json(SignCloudinaryResponse { signature }))
}

/// Unparseable ids cannot match a record, so they answer 404 like unknown ones.
fn media_id(raw: &str, not_found: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(not_found.to_string()))
}

#[utoipa::path(
    get,
    path = "/public/media/video",
    tag = "public",
    params(PageQuery),
    responses(
        (status = 200, description = "Ready videos, newest first", body = [PublicVideoSummary])
    )
)]
#[tracing::instrument(skip(state), fields(operation = "list_public_videos"))]
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let limit = parse_positive(query.limit.as_deref()).unwrap_or(0);
    Ok(Json(state.media.list_public_videos(query.page(), limit).await?))
}

#[utoipa::path(
    get,
    path = "/public/media/video/{id}",
    tag = "public",
    params(("id" = String, Path, description = "Media ID")),
    responses(
        (status = 200, description = "Video detail", body = VideoDetail),
        (status = 400, description = "Media is not a video", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(media_id = %id, operation = "get_public_video"))]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = media_id(&id, "Video not found")?;
    Ok(Json(state.media.public_video(id).await?))
}

#[utoipa::path(
    get,
    path = "/public/media/audio",
    tag = "public",
    responses(
        (status = 200, description = "Newest 100 ready audio files", body = [PublicAudioSummary])
    )
)]
#[tracing::instrument(skip(state), fields(operation = "list_public_audio"))]
pub async fn list_audio(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.media.list_public_audio().await?))
}

#[utoipa::path(
    get,
    path = "/public/media/audio/{id}",
    tag = "public",
    params(("id" = String, Path, description = "Media ID")),
    responses(
        (status = 200, description = "Audio detail", body = AudioDetail),
        (status = 400, description = "Media is not an audio", body = ErrorResponse),
        (status = 404, description = "Audio not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(media_id = %id, operation = "get_public_audio"))]
pub async fn get_audio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = media_id(&id, "Audio not found")?;
    Ok(Json(state.media.public_audio(id).await?))
}
