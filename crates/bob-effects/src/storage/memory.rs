//! In-memory world state

use bob_core::effects::{StateError, TransactionGuard, WorldStateEffects, WriteOp};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::scan_range;

/// In-memory world state for tests and ephemeral runs
///
/// Clones share the same underlying map and the same transaction lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorldState {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    tx_lock: Arc<Mutex<()>>,
}

impl MemoryWorldState {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every entry, in key order
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.data.read().clone()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl WorldStateEffects for MemoryWorldState {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StateError> {
        if key.is_empty() {
            return Err(StateError::InvalidKey {
                reason: "key must not be empty".to_string(),
            });
        }
        self.data.write().insert(key.to_string(), value);
        Ok(())
    }

    fn delete_state(&self, key: &str) -> Result<(), StateError> {
        self.data.write().remove(key);
        Ok(())
    }

    fn range_scan(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>, StateError> {
        Ok(scan_range(&self.data.read(), start, end))
    }

    fn lock_transactions(&self) -> Result<TransactionGuard<'_>, StateError> {
        Ok(TransactionGuard::new(self.tx_lock.lock()))
    }

    fn write_batch(&self, batch: Vec<WriteOp>) -> Result<(), StateError> {
        if batch.iter().any(|(key, _)| key.is_empty()) {
            return Err(StateError::InvalidKey {
                reason: "key must not be empty".to_string(),
            });
        }
        let mut data = self.data.write();
        for (key, value) in batch {
            match value {
                Some(bytes) => {
                    data.insert(key, bytes);
                }
                None => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }
}
