//! Contract and milestone records

use bob_core::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an escrow contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscrowStatus {
    /// Recorded, nothing locked yet
    Created,
    /// Funds locked, no milestone released
    Funded,
    /// Some but not all milestones released
    InProgress,
    /// Every milestone released (terminal)
    Completed,
    /// Refunded to the client (terminal)
    Refunded,
}

impl EscrowStatus {
    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Funded => "FUNDED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Refunded => "REFUNDED",
        }
    }

    /// Funds may be locked (or re-locked)
    pub fn can_lock(self) -> bool {
        matches!(self, Self::Created | Self::Funded)
    }

    /// Milestones may be released
    pub fn can_release(self) -> bool {
        matches!(self, Self::Funded | Self::InProgress)
    }

    /// The contract may be refunded
    pub fn can_refund(self) -> bool {
        !self.is_terminal()
    }

    /// No further transitions are possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Refunded)
    }
}

impl fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneStatus {
    /// Awaiting release
    Pending,
    /// Paid out
    Released,
    /// Cancelled by a refund
    Refunded,
}

impl MilestoneStatus {
    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Released => "RELEASED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deliverable inside a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    /// Identifier; release acts on the first milestone carrying it
    #[serde(default)]
    pub milestone_id: String,
    /// Free text
    pub description: String,
    /// Value in atomic units
    pub amount: Amount,
    /// Current status
    pub status: MilestoneStatus,
    /// RFC 3339 release time, set only once released
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<String>,
}

/// Escrow agreement record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowContract {
    /// Caller-chosen identifier
    pub contract_id: String,
    /// Owning project
    pub project_id: String,
    /// Paying party
    pub client_address: String,
    /// Paid party
    pub freelancer_address: String,
    /// Agreed total in atomic units
    pub total_amount: Amount,
    /// Currently locked amount in atomic units
    pub locked_amount: Amount,
    /// Lifecycle status
    pub status: EscrowStatus,
    /// Ordered milestones
    pub milestones: Vec<Milestone>,
    /// RFC 3339 creation time
    pub created_at: String,
    /// RFC 3339 time of the last change
    pub updated_at: String,
}

impl EscrowContract {
    /// True when every milestone has been released.
    ///
    /// A contract without milestones counts as fully released.
    pub fn all_released(&self) -> bool {
        self.milestones
            .iter()
            .all(|m| m.status == MilestoneStatus::Released)
    }

    /// Sum of released milestone amounts
    pub fn released_amount(&self) -> Amount {
        self.sum_where(MilestoneStatus::Released)
    }

    /// Sum of pending milestone amounts
    pub fn pending_amount(&self) -> Amount {
        self.sum_where(MilestoneStatus::Pending)
    }

    fn sum_where(&self, status: MilestoneStatus) -> Amount {
        self.milestones
            .iter()
            .filter(|m| m.status == status)
            .map(|m| &m.amount)
            .sum()
    }
}

/// Milestone as supplied to contract creation
///
/// Any `status` or `releasedAt` in the input is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneTerms {
    /// Identifier; release acts on the first milestone carrying it
    #[serde(default)]
    pub milestone_id: String,
    /// Free text
    #[serde(default)]
    pub description: String,
    /// Decimal token amount
    #[serde(default)]
    pub amount: String,
}

impl MilestoneTerms {
    /// Terms for one milestone
    pub fn new(
        milestone_id: impl Into<String>,
        description: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            milestone_id: milestone_id.into(),
            description: description.into(),
            amount: amount.into(),
        }
    }
}

/// Arguments of contract creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTerms {
    /// New contract identifier
    pub contract_id: String,
    /// Owning project
    pub project_id: String,
    /// Paying party
    pub client_address: String,
    /// Paid party
    pub freelancer_address: String,
    /// Decimal token amount
    pub total_amount: String,
    /// Milestones in order
    pub milestones: Vec<MilestoneTerms>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn milestone(id: &str, tokens: u32, status: MilestoneStatus) -> Milestone {
        Milestone {
            milestone_id: id.to_string(),
            description: String::new(),
            amount: Amount::from_tokens(tokens),
            status,
            released_at: None,
        }
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(EscrowStatus::InProgress).unwrap(),
            json!("IN_PROGRESS")
        );
        let parsed: MilestoneStatus = serde_json::from_value(json!("RELEASED")).unwrap();
        assert_eq!(parsed, MilestoneStatus::Released);
        assert_eq!(EscrowStatus::Completed.to_string(), "COMPLETED");
    }

    #[test]
    fn test_transition_guards() {
        assert!(EscrowStatus::Created.can_lock());
        assert!(EscrowStatus::Funded.can_lock());
        assert!(!EscrowStatus::InProgress.can_lock());
        assert!(!EscrowStatus::Created.can_release());
        assert!(EscrowStatus::InProgress.can_release());
        assert!(EscrowStatus::InProgress.can_refund());
        assert!(!EscrowStatus::Completed.can_refund());
        assert!(!EscrowStatus::Refunded.can_refund());
    }

    #[test]
    fn test_released_at_omitted_when_absent() {
        let value = serde_json::to_value(milestone("m1", 1, MilestoneStatus::Pending)).unwrap();
        assert!(value.get("releasedAt").is_none());
        assert_eq!(value["amount"], "1000000000000000000");
    }

    #[test]
    fn test_amount_helpers() {
        let contract = EscrowContract {
            contract_id: "c1".into(),
            project_id: "p1".into(),
            client_address: "client".into(),
            freelancer_address: "dev".into(),
            total_amount: Amount::from_tokens(6),
            locked_amount: Amount::zero(),
            status: EscrowStatus::InProgress,
            milestones: vec![
                milestone("m1", 1, MilestoneStatus::Released),
                milestone("m2", 2, MilestoneStatus::Pending),
                milestone("m3", 3, MilestoneStatus::Released),
            ],
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert_eq!(contract.released_amount(), Amount::from_tokens(4));
        assert_eq!(contract.pending_amount(), Amount::from_tokens(2));
        assert!(!contract.all_released());
    }

    #[test]
    fn test_terms_default_missing_fields() {
        let terms: Vec<MilestoneTerms> =
            serde_json::from_str(r#"[{"description":"unnamed"}]"#).unwrap();
        assert_eq!(terms[0], MilestoneTerms::new("", "unnamed", ""));
    }

    #[test]
    fn test_terms_ignore_supplied_status() {
        let terms: Vec<MilestoneTerms> = serde_json::from_str(
            r#"[{"milestoneId":"m1","description":"d","amount":"1","status":"RELEASED"}]"#,
        )
        .unwrap();
        assert_eq!(terms[0], MilestoneTerms::new("m1", "d", "1"));
    }
}
