//! # Bob Effects - Layer 3: Implementation (Effect Handlers)
//!
//! **Purpose**: Concrete handlers for the effect traits declared in `bob-core`.
//!
//! # Architecture Constraints
//!
//! **Layer 3 depends only on bob-core** (foundation).
//! - YES World-state stores (memory, JSON snapshot file)
//! - YES Clocks, static identity, event log
//! - YES Transaction envelope with buffered writes and events
//! - NO ledger or escrow rules
//!
//! ## Transactions
//!
//! [`execute`] runs one operation inside a [`TransactionContext`]. Reads see
//! the operation's own earlier writes; writes and events reach the underlying
//! handlers only when the operation returns `Ok`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Event sinks
pub mod events;

/// Caller identity handlers
pub mod identity;

/// World-state stores
pub mod storage;

/// Clock handlers
pub mod time;

/// Transaction envelope
pub mod transaction;

pub use events::{EventLog, RecordedEvent};
pub use identity::StaticIdentity;
pub use storage::{FileWorldState, MemoryWorldState};
pub use time::{FixedClock, SystemClock};
pub use transaction::{execute, TransactionContext};
