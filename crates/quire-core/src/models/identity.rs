use serde::Serialize;
use std::fmt;

/// How the caller proved who they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// Client-supplied `X-Virtual-User-ID` header, no cryptographic backing
    Virtual,
    /// Subject claim read from an (unverified) bearer token
    Bearer,
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthScheme::Virtual => write!(f, "virtual"),
            AuthScheme::Bearer => write!(f, "jwt"),
        }
    }
}

/// Caller identity resolved for a single request. Never persisted.
///
/// Equality only looks at `subject`; the scheme is informational.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub subject: String,
    pub scheme: AuthScheme,
}

impl Identity {
    pub fn new(subject: impl Into<String>, scheme: AuthScheme) -> Self {
        Self {
            subject: subject.into(),
            scheme,
        }
    }

    pub fn virtual_user(subject: impl Into<String>) -> Self {
        Self::new(subject, AuthScheme::Virtual)
    }

    pub fn bearer(subject: impl Into<String>) -> Self {
        Self::new(subject, AuthScheme::Bearer)
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.subject == other.subject
    }
}

impl Eq for Identity {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_scheme() {
        assert_eq!(Identity::virtual_user("u1"), Identity::bearer("u1"));
        assert_ne!(Identity::bearer("u1"), Identity::bearer("U1"));
    }
}
