//! Quire Storage Library
//!
//! Blob storage for uploaded media. Services only see the [`Storage`] trait:
//! `put`, `delete`, `exists` and `presign_get`, plus the public URL scheme of the backend.
//!
//! # Storage key format
//!
//! `{image|video|audio|other}/{base name}-{uuid}{ext}`. Keys must not contain `..`
//! or a leading `/`. Key generation is centralized in the `keys` module so all
//! backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{generate_media_key, CACHE_CONTROL};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use quire_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
