//! Quire database layer
//!
//! Repository traits for documents, articles and media, their PostgreSQL
//! implementations, and (behind the `memory` feature) in-memory doubles.

pub mod db;

pub use db::*;
