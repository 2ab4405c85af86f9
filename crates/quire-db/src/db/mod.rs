//! Database repositories for data access layer
//!
//! Each entity has a repository trait so services can be handed either the
//! PostgreSQL implementation or an in-memory one. Services receive them as
//! `Arc<dyn ...Repository>` at construction time.

pub mod article;
pub mod document;
pub mod media;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod transaction;

pub use article::{ArticleRepository, PostgresArticleRepository};
pub use document::{DocumentRepository, PostgresDocumentRepository};
pub use media::{MediaRepository, PostgresMediaRepository};
#[cfg(any(test, feature = "memory"))]
pub use memory::{InMemoryArticleRepository, InMemoryDocumentRepository, InMemoryMediaRepository};
pub use transaction::TransactionGuard;
