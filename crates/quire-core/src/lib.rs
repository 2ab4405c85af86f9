//! Quire Core Library
//!
//! Domain models, error types, configuration and pagination rules shared by
//! every Quire crate. Nothing in here performs I/O beyond reading the environment.

pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use pagination::PageRequest;
pub use storage_types::StorageBackend;
