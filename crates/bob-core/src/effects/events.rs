//! Event emission effect trait
//!
//! Events are named opaque payloads handed to the platform. They become
//! visible to subscribers only when the emitting transaction commits.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Error type for event emission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum EventError {
    /// Event name was empty
    #[error("event name must not be empty")]
    EmptyName,
    /// The sink refused the event
    #[error("Event rejected: {0}")]
    Rejected(String),
}

/// Sink for transaction events.
pub trait EventEffects {
    /// Emit `payload` under `name`.
    fn emit_event(&self, name: &str, payload: Vec<u8>) -> Result<(), EventError>;
}

/// Blanket implementation for Arc<T> where T: EventEffects
impl<T: EventEffects + ?Sized> EventEffects for Arc<T> {
    fn emit_event(&self, name: &str, payload: Vec<u8>) -> Result<(), EventError> {
        (**self).emit_event(name, payload)
    }
}
