//! OpenAPI documentation, served at `/api/openapi.json` and browsable at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use crate::services;
use quire_core::{models, pagination};

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quire API",
        version = "0.1.0",
        description = "Documents, blog articles and media for the Quire editor. Routes under /documents, /media and /update-stories-user need an X-Virtual-User-ID header or a bearer token."
    ),
    paths(
        // Health
        handlers::health::root,
        handlers::health::health_check,
        handlers::health::readiness_check,
        // Documents
        handlers::documents::create_empty_document,
        handlers::documents::document_exists,
        handlers::documents::get_document,
        handlers::documents::list_user_documents,
        handlers::documents::update_document,
        handlers::documents::publish_document,
        handlers::documents::unpublish_document,
        handlers::documents::delete_document,
        handlers::users::migrate_owner,
        // Public
        handlers::public::list_published_documents,
        handlers::public::sign_cloudinary,
        handlers::public::list_videos,
        handlers::public::get_video,
        handlers::public::list_audio,
        handlers::public::get_audio,
        // Articles
        handlers::articles::create_article,
        handlers::articles::update_article,
        handlers::articles::delete_article,
        handlers::articles::get_article,
        handlers::articles::list_articles,
        // Media
        handlers::media::upload_media,
        handlers::media::upload_video,
        handlers::media::upload_audio,
        handlers::media::delete_media,
        handlers::media::presign_media_url,
    ),
    components(
        schemas(
            error::ErrorResponse,
            models::Document,
            models::DocumentPatch,
            models::DocumentSummary,
            models::PublicDocumentSummary,
            models::ImageRef,
            models::Article,
            models::ArticleInput,
            models::ArticleSummary,
            models::MediaMeta,
            models::PublicVideoSummary,
            models::PublicAudioSummary,
            models::VideoDetail,
            models::AudioDetail,
            pagination::PageMeta,
            services::PresignedUrl,
            handlers::public::PublishedDocumentsResponse,
            handlers::public::SignCloudinaryRequest,
            handlers::public::SignCloudinaryResponse,
            handlers::articles::ArticleListResponse,
            handlers::articles::MessageResponse,
            handlers::media::MediaUploadResponse,
            handlers::media::VideoUploadResponse,
            handlers::media::AudioUploadResponse,
            handlers::media::DeleteMediaResponse,
            handlers::users::MigrateOwnerResponse,
        )
    ),
    tags(
        (name = "health", description = "Liveness and readiness"),
        (name = "documents", description = "Editor documents owned by the caller"),
        (name = "public", description = "Unauthenticated feeds and upload signing"),
        (name = "articles", description = "Blog articles"),
        (name = "media", description = "File, video and audio uploads"),
        (name = "users", description = "Account linking"),
    )
)]
pub struct ApiDoc;
