//! JSON snapshot world state
//!
//! The whole namespace lives in one JSON document:
//!
//! ```json
//! { "version": 1, "entries": { "<key>": "<base64 value>" } }
//! ```
//!
//! The document is loaded on open and rewritten after every mutation.
//! Writes go to a sibling temp file that is then renamed over the snapshot,
//! so a crash leaves either the old or the new document on disk.
//!
//! A transaction holds both an in-process lock and a sibling `.lock` file
//! created exclusively, so handles in other processes wait their turn. The
//! snapshot is reloaded once the lock is taken. A lock file left behind by a
//! crashed process must be removed by hand.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bob_core::effects::{StateError, TransactionGuard, WorldStateEffects, WriteOp};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::scan_range;

const SNAPSHOT_VERSION: u32 = 1;

/// How long a transaction waits for another process to release the store
const LOCK_WAIT: Duration = Duration::from_secs(5);
const LOCK_POLL: Duration = Duration::from_millis(10);

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    entries: BTreeMap<String, String>,
}

/// World state persisted as a JSON snapshot file
#[derive(Debug)]
pub struct FileWorldState {
    path: PathBuf,
    data: RwLock<BTreeMap<String, Vec<u8>>>,
    tx_lock: Mutex<()>,
}

/// Exclusively created marker file, removed on drop
#[derive(Debug)]
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    fn acquire(path: PathBuf, wait: Duration) -> Result<Self, StateError> {
        let deadline = Instant::now() + wait;
        loop {
            match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        warn!(path = %path.display(), "World-state lock still held");
                        return Err(StateError::WriteFailed(format!(
                            "{} is held by another process",
                            path.display()
                        )));
                    }
                    thread::sleep(LOCK_POLL);
                }
                Err(e) => {
                    return Err(StateError::WriteFailed(format!(
                        "create {}: {e}",
                        path.display()
                    )))
                }
            }
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to release world-state lock");
        }
    }
}

impl FileWorldState {
    /// Open the snapshot at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let path = path.into();
        let data = if path.exists() {
            load_snapshot(&path)?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), entries = data.len(), "Opened world-state snapshot");
        Ok(Self {
            path,
            data: RwLock::new(data),
            tx_lock: Mutex::new(()),
        })
    }

    fn lock_with_wait(&self, wait: Duration) -> Result<TransactionGuard<'_>, StateError> {
        let in_process = self.tx_lock.lock();
        self.ensure_parent()?;
        let lock_file = LockFile::acquire(self.path.with_extension("json.lock"), wait)?;
        if self.path.exists() {
            *self.data.write() = load_snapshot(&self.path)?;
        }
        Ok(TransactionGuard::new((lock_file, in_process)))
    }

    fn ensure_parent(&self) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                StateError::WriteFailed(format!("create {}: {e}", parent.display()))
            })?;
        }
        Ok(())
    }

    fn persist(&self, data: &BTreeMap<String, Vec<u8>>) -> Result<(), StateError> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            entries: data
                .iter()
                .map(|(key, value)| (key.clone(), STANDARD.encode(value)))
                .collect(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| StateError::WriteFailed(format!("encode snapshot: {e}")))?;

        self.ensure_parent()?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)
            .map_err(|e| StateError::WriteFailed(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            StateError::WriteFailed(format!("rename to {}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), entries = data.len(), "Persisted world-state snapshot");
        Ok(())
    }

    fn apply(&self, batch: Vec<WriteOp>) -> Result<(), StateError> {
        if batch.iter().any(|(key, _)| key.is_empty()) {
            return Err(StateError::InvalidKey {
                reason: "key must not be empty".to_string(),
            });
        }
        let mut data = self.data.write();
        let mut next = data.clone();
        for (key, value) in batch {
            match value {
                Some(bytes) => {
                    next.insert(key, bytes);
                }
                None => {
                    next.remove(&key);
                }
            }
        }
        self.persist(&next)?;
        *data = next;
        Ok(())
    }
}

fn load_snapshot(path: &Path) -> Result<BTreeMap<String, Vec<u8>>, StateError> {
    let raw = fs::read(path)
        .map_err(|e| StateError::ReadFailed(format!("read {}: {e}", path.display())))?;
    let snapshot: Snapshot = serde_json::from_slice(&raw)
        .map_err(|e| StateError::ReadFailed(format!("decode {}: {e}", path.display())))?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(StateError::ReadFailed(format!(
            "unsupported snapshot version {} in {}",
            snapshot.version,
            path.display()
        )));
    }
    snapshot
        .entries
        .into_iter()
        .map(|(key, encoded)| {
            STANDARD
                .decode(encoded.as_bytes())
                .map(|value| (key.clone(), value))
                .map_err(|e| StateError::ReadFailed(format!("decode value of {key:?}: {e}")))
        })
        .collect()
}

impl WorldStateEffects for FileWorldState {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StateError> {
        self.apply(vec![(key.to_string(), Some(value))])
    }

    fn delete_state(&self, key: &str) -> Result<(), StateError> {
        self.apply(vec![(key.to_string(), None)])
    }

    fn range_scan(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>, StateError> {
        Ok(scan_range(&self.data.read(), start, end))
    }

    fn lock_transactions(&self) -> Result<TransactionGuard<'_>, StateError> {
        self.lock_with_wait(LOCK_WAIT)
    }

    fn write_batch(&self, batch: Vec<WriteOp>) -> Result<(), StateError> {
        self.apply(batch)
    }
}
