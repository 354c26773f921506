//! Transaction time effect trait
//!
//! The platform stamps every transaction once; all timestamps written by an
//! invocation derive from that value so replicas agree on them. Handlers must
//! not read the wall clock per call inside one transaction.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Timestamp assigned to a transaction by the platform.
pub type TxTimestamp = DateTime<Utc>;

/// Error type for time operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum TimeError {
    /// No timestamp available for the current transaction
    #[error("Transaction timestamp unavailable: {reason}")]
    Unavailable {
        /// Why the timestamp could not be produced
        reason: String,
    },
}

/// Source of the current transaction's timestamp.
pub trait TimeEffects {
    /// Timestamp of the transaction being executed.
    fn transaction_timestamp(&self) -> Result<TxTimestamp, TimeError>;
}

/// RFC 3339 rendering used in stored records, second precision, `Z` suffix.
pub fn to_rfc3339(timestamp: &TxTimestamp) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Blanket implementation for Arc<T> where T: TimeEffects
impl<T: TimeEffects + ?Sized> TimeEffects for Arc<T> {
    fn transaction_timestamp(&self) -> Result<TxTimestamp, TimeError> {
        (**self).transaction_timestamp()
    }
}
