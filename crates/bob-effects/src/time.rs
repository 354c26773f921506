//! Clock handlers
//!
//! A clock answers `transaction_timestamp` for the invocation about to run.
//! [`execute`](crate::execute) samples it once per transaction.

use bob_core::effects::{TimeEffects, TimeError, TxTimestamp};
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// Wall-clock time for production runs
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeEffects for SystemClock {
    fn transaction_timestamp(&self) -> Result<TxTimestamp, TimeError> {
        Ok(Utc::now())
    }
}

/// Controllable clock for tests and replay
///
/// Clones share the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<TxTimestamp>>,
}

impl FixedClock {
    /// Clock frozen at `at`
    pub fn new(at: TxTimestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(at)),
        }
    }

    /// Move the clock to `at`
    pub fn set(&self, at: TxTimestamp) {
        *self.now.lock() = at;
    }

    /// Move the clock forward by `by`
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    /// Current instant
    pub fn now(&self) -> TxTimestamp {
        *self.now.lock()
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::new(TxTimestamp::default())
    }
}

impl TimeEffects for FixedClock {
    fn transaction_timestamp(&self) -> Result<TxTimestamp, TimeError> {
        Ok(self.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bob_core::effects::to_rfc3339;

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::default();
        assert_eq!(
            to_rfc3339(&clock.transaction_timestamp().unwrap()),
            "1970-01-01T00:00:00Z"
        );
        clock.advance(Duration::seconds(90));
        assert_eq!(to_rfc3339(&clock.now()), "1970-01-01T00:01:30Z");
    }

    #[test]
    fn test_clones_share_instant() {
        let clock = FixedClock::default();
        let shared = clock.clone();
        clock.advance(Duration::hours(1));
        assert_eq!(shared.now(), clock.now());
    }
}
