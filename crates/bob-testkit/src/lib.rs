//! Bob Testing Infrastructure
//!
//! Ready-made world state, clock, identity and event log wired together so
//! ledger and escrow tests can run operations through real transactions
//! without repeating the setup.
//!
//! # Usage
//!
//! ```rust,no_run
//! use bob_testkit::LedgerFixture;
//!
//! let fixture = LedgerFixture::initialized();
//! fixture.token(|ledger| ledger.mint("alice", "10")).unwrap();
//! assert_eq!(fixture.balance("alice"), "10000000000000000000");
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

/// In-memory ledger and escrow fixture
pub mod fixture;

/// Proptest strategies for amounts, addresses and operation sequences
pub mod strategies;

pub use fixture::*;
