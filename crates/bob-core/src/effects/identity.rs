//! Caller identity effect trait
//!
//! Resolves an opaque hint about who submitted the transaction (for example a
//! membership-service identifier). No authorization decision is made from it;
//! operations only require that it resolves.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Error type for identity resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum IdentityError {
    /// Caller identity could not be determined
    #[error("failed to get client identity: {reason}")]
    Unresolved {
        /// Why resolution failed
        reason: String,
    },
}

/// Source of the caller identity hint.
pub trait IdentityEffects {
    /// Opaque identifier of the submitting client.
    fn caller_identity(&self) -> Result<String, IdentityError>;
}

/// Blanket implementation for Arc<T> where T: IdentityEffects
impl<T: IdentityEffects + ?Sized> IdentityEffects for Arc<T> {
    fn caller_identity(&self) -> Result<String, IdentityError> {
        (**self).caller_identity()
    }
}
