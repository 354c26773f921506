//! Layer 3: World-State Handlers
//!
//! Implementations of `WorldStateEffects` from bob-core. Both keep entries in
//! a sorted map so range scans come back in ascending key order.

/// JSON snapshot file store
pub mod filesystem;

/// In-memory store
pub mod memory;

pub use filesystem::FileWorldState;
pub use memory::MemoryWorldState;

use std::collections::BTreeMap;
use std::ops::Bound;

/// Entries of `data` with `start <= key < end`; an empty `end` is unbounded.
pub(crate) fn scan_range(
    data: &BTreeMap<String, Vec<u8>>,
    start: &str,
    end: &str,
) -> Vec<(String, Vec<u8>)> {
    let upper = if end.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Excluded(end)
    };
    if !end.is_empty() && end <= start {
        return Vec::new();
    }
    data.range::<str, _>((Bound::Included(start), upper))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
