//! Data models for the application
//!
//! Organized by domain: the caller identity, editor documents, blog articles
//! and uploaded media.

mod article;
mod document;
mod identity;
mod media;

pub use article::*;
pub use document::*;
pub use identity::*;
pub use media::*;
