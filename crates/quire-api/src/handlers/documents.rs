//! Document handlers. Every route here sits behind the identity middleware.

use crate::auth::Caller;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use quire_core::models::{Document, DocumentPatch, DocumentSummary};
use quire_core::AppError;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/documents/createEmptyDoc",
    tag = "documents",
    responses(
        (status = 201, description = "Document created", body = Document),
        (status = 401, description = "No caller identity", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, caller),
    fields(caller = %caller.subject(), operation = "create_empty_document")
)]
pub async fn create_empty_document(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<impl IntoResponse, HttpAppError> {
    let document = state.documents.create_empty(caller.subject()).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

#[utoipa::path(
    get,
    path = "/documents/findDoc/{id}",
    tag = "documents",
    params(("id" = String, Path, description = "Document ID")),
    responses((status = 200, description = "Whether the document exists", body = bool))
)]
#[tracing::instrument(
    skip(state, _caller),
    fields(document_id = %id, operation = "document_exists")
)]
pub async fn document_exists(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.documents.exists(&id).await?))
}

/// Any authenticated caller may read any document by id.
#[utoipa::path(
    get,
    path = "/documents/{id}",
    tag = "documents",
    params(("id" = String, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document found", body = Document),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, _caller), fields(document_id = %id, operation = "get_document"))]
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let document = state
        .documents
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;
    Ok(Json(document))
}

#[utoipa::path(
    get,
    path = "/documents/user",
    tag = "documents",
    responses(
        (status = 200, description = "Documents owned by the caller", body = [DocumentSummary])
    )
)]
#[tracing::instrument(
    skip(state, caller),
    fields(caller = %caller.subject(), operation = "list_user_documents")
)]
pub async fn list_user_documents(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.documents.list_by_owner(caller.subject()).await?))
}

#[utoipa::path(
    put,
    path = "/documents/{id}",
    tag = "documents",
    params(("id" = String, Path, description = "Document ID")),
    request_body = DocumentPatch,
    responses(
        (status = 200, description = "Updated document", body = Document),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, caller, patch),
    fields(document_id = %id, caller = %caller.subject(), operation = "update_document")
)]
pub async fn update_document(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
    ValidatedJson(patch): ValidatedJson<DocumentPatch>,
) -> Result<impl IntoResponse, HttpAppError> {
    let document = state
        .documents
        .update(&id, caller.subject(), patch)
        .await?
        .into_result()?;
    Ok(Json(document))
}

#[utoipa::path(
    patch,
    path = "/documents/{id}/publish",
    tag = "documents",
    params(("id" = String, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document is public", body = bool),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, caller),
    fields(document_id = %id, caller = %caller.subject(), operation = "publish_document")
)]
pub async fn publish_document(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .documents
        .publish(&id, caller.subject())
        .await?
        .into_result()?;
    Ok(Json(true))
}

#[utoipa::path(
    patch,
    path = "/documents/{id}/unpublish",
    tag = "documents",
    params(("id" = String, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document is private", body = bool),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, caller),
    fields(document_id = %id, caller = %caller.subject(), operation = "unpublish_document")
)]
pub async fn unpublish_document(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .documents
        .unpublish(&id, caller.subject())
        .await?
        .into_result()?;
    Ok(Json(true))
}

/// A missing document and a document owned by someone else both answer 403.
#[utoipa::path(
    delete,
    path = "/documents/deleteDoc/{id}",
    tag = "documents",
    params(("id" = String, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document deleted", body = bool),
        (status = 403, description = "Not the owner, or no such document", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, caller),
    fields(document_id = %id, caller = %caller.subject(), operation = "delete_document")
)]
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !state.documents.delete(&id, caller.subject()).await? {
        return Err(AppError::Forbidden(
            "No permission to delete this document or document not found".to_string(),
        )
        .into());
    }
    Ok(Json(true))
}
