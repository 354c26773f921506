//! Transaction envelope
//!
//! A [`TransactionContext`] wraps a base store and implements every effect
//! trait the ledger needs. Writes and events are buffered; the context reads
//! its own buffered writes before falling back to the base store. Nothing
//! reaches the base store or the event sink until [`TransactionContext::commit`].
//!
//! [`execute`] holds the store's transaction lock from before the first read
//! until after the commit, so invocations against one store are serially
//! ordered even when several handles share it.

use bob_core::effects::{
    EventEffects, EventError, IdentityEffects, IdentityError, StateError, TimeEffects, TimeError,
    TxTimestamp, WorldStateEffects,
};
use bob_core::Result;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::ops::Bound;
use tracing::{debug, warn};

/// Buffered view over a base store for one invocation
pub struct TransactionContext<'a> {
    base: &'a dyn WorldStateEffects,
    identity: &'a dyn IdentityEffects,
    timestamp: TxTimestamp,
    writes: Mutex<BTreeMap<String, Option<Vec<u8>>>>,
    events: Mutex<Vec<(String, Vec<u8>)>>,
}

impl<'a> TransactionContext<'a> {
    /// Open a transaction stamped with the clock's current reading.
    pub fn begin(
        base: &'a dyn WorldStateEffects,
        clock: &dyn TimeEffects,
        identity: &'a dyn IdentityEffects,
    ) -> Result<Self> {
        let timestamp = clock.transaction_timestamp()?;
        Ok(Self {
            base,
            identity,
            timestamp,
            writes: Mutex::new(BTreeMap::new()),
            events: Mutex::new(Vec::new()),
        })
    }

    /// Number of keys written so far
    pub fn pending_writes(&self) -> usize {
        self.writes.lock().len()
    }

    /// Number of events buffered so far
    pub fn pending_events(&self) -> usize {
        self.events.lock().len()
    }

    /// Apply buffered writes to the base store, then publish buffered events.
    ///
    /// Only the write batch can fail the commit. Event names were already
    /// checked when buffered, and once the batch is applied the transaction
    /// stands, so a sink failure is logged rather than returned.
    pub fn commit(self, sink: &dyn EventEffects) -> Result<()> {
        let writes = self.writes.into_inner();
        let events = self.events.into_inner();
        debug!(writes = writes.len(), events = events.len(), "Committing transaction");

        self.base.write_batch(writes.into_iter().collect())?;
        for (name, payload) in events {
            if let Err(err) = sink.emit_event(&name, payload) {
                warn!(event = %name, error = %err, "Event dropped after commit");
            }
        }
        Ok(())
    }
}

impl WorldStateEffects for TransactionContext<'_> {
    fn get_state(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, StateError> {
        if let Some(buffered) = self.writes.lock().get(key) {
            return Ok(buffered.clone());
        }
        self.base.get_state(key)
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> std::result::Result<(), StateError> {
        if key.is_empty() {
            return Err(StateError::InvalidKey {
                reason: "key must not be empty".to_string(),
            });
        }
        self.writes.lock().insert(key.to_string(), Some(value));
        Ok(())
    }

    fn delete_state(&self, key: &str) -> std::result::Result<(), StateError> {
        self.writes.lock().insert(key.to_string(), None);
        Ok(())
    }

    fn range_scan(
        &self,
        start: &str,
        end: &str,
    ) -> std::result::Result<Vec<(String, Vec<u8>)>, StateError> {
        if !end.is_empty() && end <= start {
            return Ok(Vec::new());
        }
        let mut merged: BTreeMap<String, Vec<u8>> =
            self.base.range_scan(start, end)?.into_iter().collect();

        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };
        let writes = self.writes.lock();
        for (key, value) in writes.range::<str, _>((Bound::Included(start), upper)) {
            match value {
                Some(bytes) => {
                    merged.insert(key.clone(), bytes.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}

impl TimeEffects for TransactionContext<'_> {
    fn transaction_timestamp(&self) -> std::result::Result<TxTimestamp, TimeError> {
        Ok(self.timestamp)
    }
}

impl IdentityEffects for TransactionContext<'_> {
    fn caller_identity(&self) -> std::result::Result<String, IdentityError> {
        self.identity.caller_identity()
    }
}

impl EventEffects for TransactionContext<'_> {
    fn emit_event(&self, name: &str, payload: Vec<u8>) -> std::result::Result<(), EventError> {
        if name.is_empty() {
            return Err(EventError::EmptyName);
        }
        self.events.lock().push((name.to_string(), payload));
        Ok(())
    }
}

/// Run `op` as one atomic, serially ordered invocation.
///
/// On `Ok` the buffered writes are committed and events published. On `Err`
/// everything the operation did is discarded and the error is returned.
pub fn execute<T, F>(
    store: &dyn WorldStateEffects,
    clock: &dyn TimeEffects,
    identity: &dyn IdentityEffects,
    sink: &dyn EventEffects,
    op: F,
) -> Result<T>
where
    F: FnOnce(&TransactionContext<'_>) -> Result<T>,
{
    let _guard = store.lock_transactions()?;
    let tx = TransactionContext::begin(store, clock, identity)?;
    match op(&tx) {
        Ok(value) => {
            tx.commit(sink)?;
            Ok(value)
        }
        Err(err) => {
            warn!(
                error = %err,
                discarded_writes = tx.pending_writes(),
                discarded_events = tx.pending_events(),
                "Transaction rolled back"
            );
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventLog, FixedClock, MemoryWorldState, StaticIdentity};
    use bob_core::LedgerError;
    use std::thread;

    struct RejectingSink;

    impl EventEffects for RejectingSink {
        fn emit_event(&self, _: &str, _: Vec<u8>) -> std::result::Result<(), EventError> {
            Err(EventError::EmptyName)
        }
    }

    struct Env {
        store: MemoryWorldState,
        clock: FixedClock,
        identity: StaticIdentity,
        log: EventLog,
    }

    impl Env {
        fn new() -> Self {
            Self {
                store: MemoryWorldState::new(),
                clock: FixedClock::default(),
                identity: StaticIdentity::new("Org1MSP"),
                log: EventLog::new(),
            }
        }

        fn run<T>(&self, op: impl FnOnce(&TransactionContext<'_>) -> Result<T>) -> Result<T> {
            execute(&self.store, &self.clock, &self.identity, &self.log, op)
        }
    }

    #[test]
    fn test_commit_applies_writes_and_events() {
        let env = Env::new();
        env.run(|tx| {
            tx.put_state("a", vec![1])?;
            tx.emit_event("Touched", b"{}".to_vec())?;
            Ok(())
        })
        .unwrap();
        assert_eq!(env.store.get_state("a").unwrap(), Some(vec![1]));
        assert_eq!(env.log.names(), vec!["Touched"]);
    }

    #[test]
    fn test_error_discards_everything() {
        let env = Env::new();
        env.store.put_state("a", vec![1]).unwrap();
        let result: Result<()> = env.run(|tx| {
            tx.put_state("a", vec![2])?;
            tx.put_state("b", vec![3])?;
            tx.emit_event("Touched", Vec::new())?;
            Err(LedgerError::invalid_argument("boom"))
        });
        assert!(result.is_err());
        assert_eq!(env.store.get_state("a").unwrap(), Some(vec![1]));
        assert_eq!(env.store.get_state("b").unwrap(), None);
        assert!(env.log.recorded().is_empty());
    }

    #[test]
    fn test_reads_see_own_writes() {
        let env = Env::new();
        env.store.put_state("a", vec![1]).unwrap();
        env.run(|tx| {
            tx.put_state("a", vec![9])?;
            assert_eq!(tx.get_state("a")?, Some(vec![9]));
            tx.delete_state("a")?;
            assert_eq!(tx.get_state("a")?, None);
            Ok(())
        })
        .unwrap();
        assert_eq!(env.store.get_state("a").unwrap(), None);
    }

    #[test]
    fn test_range_scan_merges_buffer() {
        let env = Env::new();
        env.store.put_state("k1", vec![1]).unwrap();
        env.store.put_state("k2", vec![2]).unwrap();
        env.run(|tx| {
            tx.delete_state("k1")?;
            tx.put_state("k3", vec![3])?;
            tx.put_state("z", vec![0])?;
            let keys: Vec<_> = tx
                .range_scan("k", "l")?
                .into_iter()
                .map(|(k, _)| k)
                .collect();
            assert_eq!(keys, vec!["k2", "k3"]);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_timestamp_fixed_for_transaction() {
        let env = Env::new();
        let first = env
            .run(|tx| {
                let a = tx.transaction_timestamp()?;
                env.clock.advance(chrono::Duration::seconds(5));
                let b = tx.transaction_timestamp()?;
                assert_eq!(a, b);
                Ok(a)
            })
            .unwrap();
        let second = env.run(|tx| Ok(tx.transaction_timestamp()?)).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_sink_failure_does_not_fail_commit() {
        let env = Env::new();
        let result = execute(&env.store, &env.clock, &env.identity, &RejectingSink, |tx| {
            tx.put_state("a", vec![1])?;
            tx.emit_event("Touched", Vec::new())?;
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(env.store.get_state("a").unwrap(), Some(vec![1]));
    }

    #[test]
    fn test_concurrent_increments_are_serialized() {
        let env = Env::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = env.store.clone();
                let clock = env.clock.clone();
                let identity = env.identity.clone();
                let log = env.log.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        execute(&store, &clock, &identity, &log, |tx| {
                            let current = tx
                                .get_state("counter")?
                                .map_or(0, |bytes| u64::from_le_bytes(bytes.try_into().unwrap()));
                            thread::yield_now();
                            tx.put_state("counter", (current + 1).to_le_bytes().to_vec())?;
                            Ok(())
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = env.store.get_state("counter").unwrap().unwrap();
        assert_eq!(u64::from_le_bytes(stored.try_into().unwrap()), 800);
    }

    #[test]
    fn test_identity_delegates() {
        let mut env = Env::new();
        env.identity = StaticIdentity::unresolved();
        let result = env.run(|tx| Ok(tx.caller_identity()?));
        assert!(matches!(result, Err(LedgerError::Identity(_))));
    }
}
