//! Event sinks

use bob_core::effects::{EventEffects, EventError};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// One emitted event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedEvent {
    /// Event name
    pub name: String,
    /// Raw payload
    pub payload: Vec<u8>,
}

impl RecordedEvent {
    /// Payload decoded as JSON, `Null` if it is not JSON
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.payload).unwrap_or(serde_json::Value::Null)
    }
}

/// Sink that keeps every committed event in memory
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl EventLog {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event recorded so far, oldest first
    pub fn recorded(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Names of every recorded event, oldest first
    pub fn names(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.name.clone()).collect()
    }

    /// Most recent event
    pub fn last(&self) -> Option<RecordedEvent> {
        self.events.lock().last().cloned()
    }

    /// Remove and return everything recorded so far
    pub fn drain(&self) -> Vec<RecordedEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventEffects for EventLog {
    fn emit_event(&self, name: &str, payload: Vec<u8>) -> Result<(), EventError> {
        if name.is_empty() {
            return Err(EventError::EmptyName);
        }
        info!(event = name, "Event emitted");
        self.events.lock().push(RecordedEvent {
            name: name.to_string(),
            payload,
        });
        Ok(())
    }
}
