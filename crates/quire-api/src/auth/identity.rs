//! Identity resolution from request headers.
//!
//! Two schemes are accepted: an opaque `X-Virtual-User-ID` header for
//! anonymous callers, and a bearer token whose payload carries the subject.
//! The token signature is NOT verified; the subject is read from the claims
//! as-is, so a bearer token is attribution, not proof of identity.

use crate::error::HttpAppError;
use axum::{
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use quire_core::models::Identity;
use quire_core::AppError;
use serde_json::Value;

pub const VIRTUAL_USER_HEADER: &str = "X-Virtual-User-ID";

const MISSING_AUTHENTICATION: &str =
    "Missing authentication, please provide X-Virtual-User-ID or Authorization";
const INVALID_AUTHENTICATION: &str = "Invalid authentication information provided";

/// Claim names consulted for the subject, in priority order.
const SUBJECT_CLAIMS: [&str; 4] = ["uid", "sub", "user_id", "email"];

/// Resolve the caller from the two identity headers.
///
/// A bearer subject wins over the virtual user id; the virtual id is only a
/// fallback when the token is missing or yields no subject. Empty header
/// values count as absent.
pub fn resolve_identity(
    virtual_user_id: Option<&str>,
    authorization: Option<&str>,
) -> Result<Identity, AppError> {
    let virtual_user_id = virtual_user_id.filter(|v| !v.is_empty());
    let authorization = authorization.filter(|v| !v.is_empty());

    if virtual_user_id.is_none() && authorization.is_none() {
        return Err(AppError::Unauthorized(MISSING_AUTHENTICATION.to_string()));
    }

    if let Some(subject) = authorization.and_then(bearer_subject) {
        return Ok(Identity::bearer(subject));
    }

    match virtual_user_id {
        Some(id) => Ok(Identity::virtual_user(id)),
        None => Err(AppError::Unauthorized(INVALID_AUTHENTICATION.to_string())),
    }
}

/// Subject carried by a `Bearer <header>.<payload>.<signature>` credential.
fn bearer_subject(authorization: &str) -> Option<String> {
    let token = authorization.strip_prefix("Bearer ")?;
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return None;
    }

    let claims = decode_claims(segments[1])?;
    SUBJECT_CLAIMS.iter().find_map(|name| match claims.get(*name) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    })
}

/// Decode a base64url JWT segment into a JSON object.
fn decode_claims(segment: &str) -> Option<serde_json::Map<String, Value>> {
    let mut standard: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while standard.len() % 4 != 0 {
        standard.push('=');
    }

    let bytes = STANDARD.decode(standard).ok()?;
    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn header_str<'a>(
    headers: &'a HeaderMap,
    name: impl axum::http::header::AsHeaderName,
) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Resolve the caller and store its [`Identity`] in the request extensions.
/// Requests without a usable identity are rejected with 401 here.
pub async fn identity_middleware(mut request: Request, next: Next) -> Response {
    let resolved = resolve_identity(
        header_str(request.headers(), VIRTUAL_USER_HEADER),
        header_str(request.headers(), AUTHORIZATION),
    );

    match resolved {
        Ok(identity) => {
            tracing::debug!(
                subject = %identity.subject,
                scheme = %identity.scheme,
                "Caller identity resolved"
            );
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}

/// The resolved caller, extracted from request extensions.
///
/// Works alongside `Multipart`, which cannot be combined with `Extension`.
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

impl Caller {
    pub fn subject(&self) -> &str {
        &self.0.subject
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Caller)
            .ok_or_else(|| HttpAppError(AppError::Unauthorized(MISSING_AUTHENTICATION.to_string())))
    }
}
