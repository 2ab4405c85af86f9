//! Ownership gate for document mutations.

/// Outcome of an ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    Denied,
}

impl Authorization {
    pub fn is_allowed(self) -> bool {
        self == Authorization::Allowed
    }
}

/// A caller may mutate a resource only when it is the recorded owner.
/// Comparison is exact: case-sensitive, no trimming.
pub fn authorize(resource_owner_id: &str, caller_subject: &str) -> Authorization {
    if resource_owner_id == caller_subject {
        Authorization::Allowed
    } else {
        Authorization::Denied
    }
}
