//! HTTP handlers, one module per resource

pub mod articles;
pub mod documents;
pub mod health;
pub mod media;
pub mod public;
pub mod users;
