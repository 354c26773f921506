//! # Bob Core - Layer 1: Foundation
//!
//! **Purpose**: Shared vocabulary for the BobCoin ledger and escrow engine.
//!
//! # Architecture Constraints
//!
//! **Layer 1 depends on no other workspace crate.**
//! - YES Fixed-point amount codec
//! - YES Unified error type
//! - YES Effect traits for world state, time, identity and events
//! - YES World-state key layout and event payloads
//! - NO effect handler implementations (use `bob-effects`)
//! - NO ledger or escrow rules (use `bob-token`, `bob-escrow`)
//!
//! ## Core Concepts
//!
//! - **Amounts**: decimal strings on input, 18-decimal atomic units in storage
//! - **Effects**: everything outside the ledger's own logic is injected
//! - **Keys**: each record kind owns an explicit key prefix

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Fixed-point amount codec
pub mod amount;

/// Effect traits implemented by platform handlers
pub mod effects;

/// Unified error types
pub mod errors;

/// Event payloads
pub mod events;

/// World-state key layout
pub mod keys;

pub use amount::{format_amount, parse_amount, Amount, AmountError, DECIMALS};
pub use effects::{
    EventEffects, IdentityEffects, LedgerEffects, StateError, TimeEffects, TxTimestamp,
    WorldStateEffects,
};
pub use errors::{ErrorCategory, LedgerError, Result};
pub use events::{publish, LedgerEvent};
