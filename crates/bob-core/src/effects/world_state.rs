//! World-state effect trait
//!
//! The key-value store a ledger invocation reads and writes. Durability,
//! ordering and replication belong to whatever implements this trait; the
//! ledger only assumes that one invocation sees a consistent view and that
//! its writes land together.
//!
//! Composite keys follow the `\0type\0part\0part\0` layout so every entry of
//! an index shares a common, range-scannable prefix.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Separator that opens and delimits every composite key.
pub const COMPOSITE_KEY_SEPARATOR: char = '\u{0}';

/// Highest Unicode scalar value; closes partial composite-key ranges.
pub const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

/// Error type for world-state operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum StateError {
    /// Key rejected by the store or by composite-key validation
    #[error("Invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected
        reason: String,
    },
    /// Read failed
    #[error("Read failed: {0}")]
    ReadFailed(String),
    /// Write failed
    #[error("Write failed: {0}")]
    WriteFailed(String),
}

/// A pending mutation: `Some(bytes)` to put, `None` to delete.
pub type WriteOp = (String, Option<Vec<u8>>);

trait Held {}
impl<T> Held for T {}

/// Exclusive hold on a store for one transaction.
///
/// While a guard is alive no other transaction can begin against the same
/// store. Dropping it lets the next one in.
#[must_use = "the store is only held while the guard is alive"]
pub struct TransactionGuard<'a> {
    held: Option<Box<dyn Held + 'a>>,
}

impl<'a> TransactionGuard<'a> {
    /// Guard that keeps `held` alive until the transaction ends.
    pub fn new<T: 'a>(held: T) -> Self {
        Self {
            held: Some(Box::new(held)),
        }
    }

    /// Guard that excludes nothing, for stores with a single caller.
    pub fn unguarded() -> Self {
        Self { held: None }
    }

    /// True when the guard holds a real exclusion.
    pub fn is_exclusive(&self) -> bool {
        self.held.is_some()
    }
}

impl std::fmt::Debug for TransactionGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionGuard")
            .field("exclusive", &self.is_exclusive())
            .finish()
    }
}

/// World-state access used by every ledger and escrow operation.
pub trait WorldStateEffects {
    /// Value stored at `key`, `None` when absent.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StateError>;

    /// Store `value` at `key`, replacing any previous value.
    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StateError>;

    /// Remove `key`; absent keys are not an error.
    fn delete_state(&self, key: &str) -> Result<(), StateError>;

    /// All entries with `start <= key < end` in ascending key order.
    /// An empty `end` leaves the range open above.
    fn range_scan(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>, StateError>;

    /// Hold the store for one transaction, from its first read to its commit.
    ///
    /// Stores reachable from more than one caller must override this so that
    /// concurrent transactions run one after another.
    fn lock_transactions(&self) -> Result<TransactionGuard<'_>, StateError> {
        Ok(TransactionGuard::unguarded())
    }

    /// Apply a batch of mutations in order.
    ///
    /// Handlers that can persist a batch in one step should override this.
    fn write_batch(&self, batch: Vec<WriteOp>) -> Result<(), StateError> {
        for (key, value) in batch {
            match value {
                Some(bytes) => self.put_state(&key, bytes)?,
                None => self.delete_state(&key)?,
            }
        }
        Ok(())
    }

    /// Build a composite key from an object type and its attributes.
    fn create_composite_key(&self, object_type: &str, attributes: &[&str]) -> Result<String, StateError> {
        create_composite_key(object_type, attributes)
    }

    /// Entries whose composite key starts with `object_type` and `attributes`.
    fn scan_partial_composite_key(
        &self,
        object_type: &str,
        attributes: &[&str],
    ) -> Result<Vec<(String, Vec<u8>)>, StateError> {
        let start = create_composite_key(object_type, attributes)?;
        let end = format!("{start}{MAX_UNICODE_RUNE}");
        self.range_scan(&start, &end)
    }
}

/// Build `\0object_type\0attr1\0attr2\0`.
pub fn create_composite_key(object_type: &str, attributes: &[&str]) -> Result<String, StateError> {
    validate_composite_part(object_type)?;
    let mut key = String::with_capacity(
        2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>(),
    );
    key.push(COMPOSITE_KEY_SEPARATOR);
    key.push_str(object_type);
    key.push(COMPOSITE_KEY_SEPARATOR);
    for attribute in attributes {
        validate_composite_part(attribute)?;
        key.push_str(attribute);
        key.push(COMPOSITE_KEY_SEPARATOR);
    }
    Ok(key)
}

/// Split a composite key back into its object type and attributes.
pub fn split_composite_key(key: &str) -> Result<(String, Vec<String>), StateError> {
    let body = key
        .strip_prefix(COMPOSITE_KEY_SEPARATOR)
        .and_then(|rest| rest.strip_suffix(COMPOSITE_KEY_SEPARATOR))
        .ok_or_else(|| StateError::InvalidKey {
            reason: "not a composite key".to_string(),
        })?;

    let mut parts = body.split(COMPOSITE_KEY_SEPARATOR).map(str::to_string);
    let object_type = parts.next().unwrap_or_default();
    Ok((object_type, parts.collect()))
}

fn validate_composite_part(part: &str) -> Result<(), StateError> {
    if part.contains(COMPOSITE_KEY_SEPARATOR) || part.contains(MAX_UNICODE_RUNE) {
        return Err(StateError::InvalidKey {
            reason: format!("composite key part {part:?} contains a reserved character"),
        });
    }
    Ok(())
}

/// Blanket implementation for Arc<T> where T: WorldStateEffects
impl<T: WorldStateEffects + ?Sized> WorldStateEffects for Arc<T> {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StateError> {
        (**self).get_state(key)
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StateError> {
        (**self).put_state(key, value)
    }

    fn delete_state(&self, key: &str) -> Result<(), StateError> {
        (**self).delete_state(key)
    }

    fn range_scan(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>, StateError> {
        (**self).range_scan(start, end)
    }

    fn lock_transactions(&self) -> Result<TransactionGuard<'_>, StateError> {
        (**self).lock_transactions()
    }

    fn write_batch(&self, batch: Vec<WriteOp>) -> Result<(), StateError> {
        (**self).write_batch(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_key_layout() {
        let key = create_composite_key("project", &["p1", "c1"]).unwrap();
        assert_eq!(key, "\u{0}project\u{0}p1\u{0}c1\u{0}");
    }

    #[test]
    fn test_split_composite_key() {
        let key = create_composite_key("project", &["p1", "c1"]).unwrap();
        let (object_type, parts) = split_composite_key(&key).unwrap();
        assert_eq!(object_type, "project");
        assert_eq!(parts, vec!["p1".to_string(), "c1".to_string()]);
    }

    #[test]
    fn test_partial_key_is_prefix() {
        let partial = create_composite_key("project", &["p1"]).unwrap();
        let full = create_composite_key("project", &["p1", "c9"]).unwrap();
        let other = create_composite_key("project", &["p10", "c1"]).unwrap();
        assert!(full.starts_with(&partial));
        assert!(!other.starts_with(&partial));
    }

    #[test]
    fn test_default_guard_is_not_exclusive() {
        struct Empty;
        impl WorldStateEffects for Empty {
            fn get_state(&self, _: &str) -> Result<Option<Vec<u8>>, StateError> {
                Ok(None)
            }
            fn put_state(&self, _: &str, _: Vec<u8>) -> Result<(), StateError> {
                Ok(())
            }
            fn delete_state(&self, _: &str) -> Result<(), StateError> {
                Ok(())
            }
            fn range_scan(&self, _: &str, _: &str) -> Result<Vec<(String, Vec<u8>)>, StateError> {
                Ok(Vec::new())
            }
        }

        assert!(!Empty.lock_transactions().unwrap().is_exclusive());
        assert!(!Arc::new(Empty).lock_transactions().unwrap().is_exclusive());
        assert!(TransactionGuard::new(()).is_exclusive());
    }

    #[test]
    fn test_reserved_characters_rejected() {
        assert!(create_composite_key("project", &["a\u{0}b"]).is_err());
        assert!(split_composite_key("plain-key").is_err());
    }
}
