//! Caller identity and ownership checks

pub mod identity;
pub mod ownership;

pub use identity::{identity_middleware, resolve_identity, Caller, VIRTUAL_USER_HEADER};
pub use ownership::{authorize, Authorization};
