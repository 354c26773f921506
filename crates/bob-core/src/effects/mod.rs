//! Effect trait definitions
//!
//! Pure trait definitions for everything a ledger invocation needs from the
//! hosting platform. This module defines **what** can be performed; handlers
//! in `bob-effects` define **how**.
//!
//! - **WorldState**: keyed reads/writes, range and composite-key scans
//! - **Time**: the transaction timestamp
//! - **Identity**: the caller identity hint
//! - **Events**: named payloads published on commit
//!
//! Domain crates are parameterized by these traits, so the same ledger code
//! runs against an in-memory store in tests and a file-backed store in the CLI.

pub mod events;
pub mod identity;
pub mod supertraits;
pub mod time;
pub mod world_state;

pub use events::{EventEffects, EventError};
pub use identity::{IdentityEffects, IdentityError};
pub use supertraits::LedgerEffects;
pub use time::{to_rfc3339, TimeEffects, TimeError, TxTimestamp};
pub use world_state::{
    create_composite_key, split_composite_key, StateError, TransactionGuard, WorldStateEffects,
    WriteOp,
    COMPOSITE_KEY_SEPARATOR, MAX_UNICODE_RUNE,
};
