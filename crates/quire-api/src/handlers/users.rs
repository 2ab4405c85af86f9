//! Account linking: move an anonymous user's documents to their signed-in identity.

use crate::auth::{Caller, VIRTUAL_USER_HEADER};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct MigrateOwnerResponse {
    pub success: bool,
    pub message: String,
    pub count: u64,
}

/// The new owner is the resolved caller; the old owner is whatever
/// `X-Virtual-User-ID` carries. Send both headers together.
#[utoipa::path(
    put,
    path = "/update-stories-user",
    tag = "users",
    params(
        (
            "X-Virtual-User-ID" = String,
            Header,
            description = "Anonymous id the documents currently belong to"
        )
    ),
    responses(
        (status = 200, description = "Documents reassigned", body = MigrateOwnerResponse),
        (status = 400, description = "Missing or identical user ids", body = ErrorResponse),
        (status = 401, description = "No caller identity", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, caller, headers),
    fields(caller = %caller.subject(), operation = "migrate_owner")
)]
pub async fn migrate_owner(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpAppError> {
    let virtual_user_id = headers
        .get(VIRTUAL_USER_HEADER)
        .and_then(|v| v.to_str().ok());

    let count = state
        .migration
        .migrate(virtual_user_id, caller.subject())
        .await?;

    Ok(Json(MigrateOwnerResponse {
        success: true,
        message: "User articles migrated successfully".to_string(),
        count,
    }))
}
