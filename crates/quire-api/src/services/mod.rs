//! Business services
//!
//! Each service is constructed once at startup with its collaborators
//! (repositories, storage, frame extractor) and cloned into the app state.

pub mod article;
pub mod cloudinary;
pub mod document;
pub mod frames;
pub mod media;
pub mod migration;

pub use article::ArticleService;
pub use cloudinary::CloudinarySigner;
pub use document::{DocumentOutcome, DocumentService};
pub use frames::{FfmpegFrameExtractor, FrameExtractor, FrameSize};
pub use media::{MediaService, MediaUpload, PresignedUrl};
pub use migration::OwnerMigrationService;
