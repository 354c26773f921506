//! # Bob Token - Layer 2: Domain Crate
//!
//! **Purpose**: The BobCoin fungible token ledger.
//!
//! One token exists per world state. Its metadata record carries the total
//! supply; each holder has a balance record. Mint and burn update both in
//! the same transaction, so at every committed state the supply equals the
//! sum of all balances.
//!
//! # Architecture Constraints
//!
//! **Layer 2 depends only on bob-core** (foundation).
//! - YES Token metadata and balance records
//! - YES Mint, burn, transfer and queries over injected effects
//! - NO handler implementations (use `bob-effects`)
//! - NO transaction management; callers run mutators inside one transaction

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Token ledger operations
pub mod ledger;

/// Token records
pub mod types;

pub use ledger::TokenLedger;
pub use types::{Balance, SupplyAudit, Token, TOKEN_DECIMALS, TOKEN_NAME, TOKEN_SYMBOL};
