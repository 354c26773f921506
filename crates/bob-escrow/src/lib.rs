//! # Bob Escrow - Layer 2: Domain Crate
//!
//! **Purpose**: Milestone-based escrow agreements between a client and a
//! freelancer.
//!
//! An escrow contract is bookkeeping only. Locking funds and releasing
//! milestones record intent; moving tokens is left to the token ledger and
//! is never performed here.
//!
//! ```text
//! CREATED --lock--> FUNDED --release(last)--> COMPLETED
//! FUNDED --release--> IN_PROGRESS --release(last)--> COMPLETED
//! CREATED | FUNDED | IN_PROGRESS --refund--> REFUNDED
//! ```
//!
//! # Architecture Constraints
//!
//! **Layer 2 depends only on bob-core** (foundation).
//! - YES Contract records, milestones and the project index
//! - YES Status transitions over injected effects
//! - NO token movements
//! - NO handler implementations (use `bob-effects`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Escrow engine operations
pub mod engine;

/// Contract and milestone records
pub mod types;

pub use engine::EscrowEngine;
pub use types::{
    ContractTerms, EscrowContract, EscrowStatus, Milestone, MilestoneStatus, MilestoneTerms,
};
