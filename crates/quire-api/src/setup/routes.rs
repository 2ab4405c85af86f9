//! Route configuration and setup

use crate::auth::identity_middleware;
use crate::handlers;
use crate::state::AppState;
use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    routing::{get, patch, post, put},
    Json, Router,
};
use quire_core::Config;
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa_rapidoc::RapiDoc;

const ALLOWED_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
];

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    // Identity is resolved for these routes only; a failure answers 401 before any handler runs
    let protected_routes = protected_routes().layer(axum::middleware::from_fn(identity_middleware));

    let http_concurrency_limit = config.http_concurrency_limit();
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let app = public_routes()
        .merge(protected_routes)
        .merge(RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_size_bytes()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let allowed_headers = [
        CONTENT_TYPE,
        AUTHORIZATION,
        ACCEPT,
        HeaderName::from_static("x-virtual-user-id"),
        HeaderName::from_static("x-requested-with"),
    ];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!(
            "CORS configured to allow all origins - not recommended for production"
        );
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(ALLOWED_METHODS)
            .allow_headers(allowed_headers)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin: {}", o))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(ALLOWED_METHODS)
            .allow_headers(allowed_headers)
            .allow_credentials(true)
            .expose_headers([CONTENT_LENGTH, CONTENT_TYPE])
            .max_age(Duration::from_secs(12 * 3600))
    };
    Ok(cors)
}

/// Public routes (no authentication required)
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .route(
            "/public/documents",
            get(handlers::public::list_published_documents),
        )
        .route(
            "/public/sign-cloudinary",
            post(handlers::public::sign_cloudinary),
        )
        .route("/public/media/video", get(handlers::public::list_videos))
        .route("/public/media/video/{id}", get(handlers::public::get_video))
        .route("/public/media/audio", get(handlers::public::list_audio))
        .route("/public/media/audio/{id}", get(handlers::public::get_audio))
        .merge(article_routes())
}

/// Article routes carry no identity at all.
fn article_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/articles",
            get(handlers::articles::list_articles).post(handlers::articles::create_article),
        )
        .route(
            "/api/articles/{id}",
            get(handlers::articles::get_article)
                .put(handlers::articles::update_article)
                .delete(handlers::articles::delete_article),
        )
}

/// Protected routes (require a caller identity).
fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(document_routes())
        .merge(media_routes())
        .route("/update-stories-user", put(handlers::users::migrate_owner))
}

fn document_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/documents/createEmptyDoc",
            post(handlers::documents::create_empty_document),
        )
        .route(
            "/documents/findDoc/{id}",
            get(handlers::documents::document_exists),
        )
        .route(
            "/documents/deleteDoc/{id}",
            axum::routing::delete(handlers::documents::delete_document),
        )
        .route(
            "/documents/user",
            get(handlers::documents::list_user_documents),
        )
        .route(
            "/documents/{id}",
            get(handlers::documents::get_document).put(handlers::documents::update_document),
        )
        .route(
            "/documents/{id}/publish",
            patch(handlers::documents::publish_document),
        )
        .route(
            "/documents/{id}/unpublish",
            patch(handlers::documents::unpublish_document),
        )
}

fn media_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/media/upload", post(handlers::media::upload_media))
        .route("/media/video", post(handlers::media::upload_video))
        .route("/media/audio", post(handlers::media::upload_audio))
        .route(
            "/media/{id}",
            axum::routing::delete(handlers::media::delete_media),
        )
        .route("/media/{id}/url", get(handlers::media::presign_media_url))
}
