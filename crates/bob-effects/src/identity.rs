//! Caller identity handlers

use bob_core::effects::{IdentityEffects, IdentityError};

/// Identity fixed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentity {
    identity: Option<String>,
}

impl StaticIdentity {
    /// Caller that always resolves to `identity`
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: Some(identity.into()),
        }
    }

    /// Caller whose identity can never be resolved
    pub fn unresolved() -> Self {
        Self { identity: None }
    }
}

impl IdentityEffects for StaticIdentity {
    fn caller_identity(&self) -> Result<String, IdentityError> {
        self.identity.clone().ok_or_else(|| IdentityError::Unresolved {
            reason: "no caller identity configured".to_string(),
        })
    }
}
