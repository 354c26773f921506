//! Ledger events
//!
//! Every state-changing operation publishes one event. Payloads are JSON
//! objects tagged with a `type` field; amounts are carried as strings so no
//! precision is lost on the wire.

use serde::{Deserialize, Serialize};

use crate::effects::EventEffects;
use crate::errors::Result;

/// Event published by a successful ledger or escrow operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    /// Tokens created
    Mint {
        /// Credited address
        to: String,
        /// Amount as supplied by the caller
        amount: String,
        /// Supply after the mint, in atomic units
        #[serde(rename = "totalSupply")]
        total_supply: String,
    },
    /// Tokens destroyed
    Burn {
        /// Debited address
        from: String,
        /// Amount as supplied by the caller
        amount: String,
        /// Supply after the burn, in atomic units
        #[serde(rename = "totalSupply")]
        total_supply: String,
    },
    /// Tokens moved between addresses
    Transfer {
        /// Debited address
        from: String,
        /// Credited address
        to: String,
        /// Amount as supplied by the caller
        amount: String,
    },
    /// Escrow contract created
    ContractCreated {
        /// New contract
        #[serde(rename = "contractId")]
        contract_id: String,
        /// Owning project
        #[serde(rename = "projectId")]
        project_id: String,
    },
    /// Escrow funds locked
    FundsLocked {
        /// Funded contract
        #[serde(rename = "contractId")]
        contract_id: String,
        /// Amount as supplied by the caller
        amount: String,
    },
    /// Escrow milestone paid out
    MilestoneReleased {
        /// Contract the milestone belongs to
        #[serde(rename = "contractId")]
        contract_id: String,
        /// Released milestone
        #[serde(rename = "milestoneId")]
        milestone_id: String,
    },
    /// Escrow contract refunded
    ProjectRefunded {
        /// Refunded contract
        #[serde(rename = "contractId")]
        contract_id: String,
        /// Locked amount at refund time, in atomic units
        amount: String,
    },
}

impl LedgerEvent {
    /// Event name used when publishing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "Mint",
            Self::Burn { .. } => "Burn",
            Self::Transfer { .. } => "Transfer",
            Self::ContractCreated { .. } => "ContractCreated",
            Self::FundsLocked { .. } => "FundsLocked",
            Self::MilestoneReleased { .. } => "MilestoneReleased",
            Self::ProjectRefunded { .. } => "ProjectRefunded",
        }
    }
}

/// Serialize `event` and hand it to the platform event sink.
pub fn publish<E: EventEffects + ?Sized>(effects: &E, event: &LedgerEvent) -> Result<()> {
    let payload = serde_json::to_vec(event)?;
    effects.emit_event(event.name(), payload)?;
    Ok(())
}
