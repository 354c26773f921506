//! Unified error system for ledger operations
//!
//! A single error type covers every way a ledger or escrow invocation can
//! fail. Variants are grouped by [`ErrorCategory`]; whichever variant is
//! returned, the surrounding transaction is discarded as a whole.

use crate::amount::AmountError;
use crate::effects::{EventError, IdentityError, StateError, TimeError};

/// Coarse classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Unparseable amounts, bad identifiers, wrong argument counts
    MalformedInput,
    /// Well-formed request refused by ledger or escrow rules
    Precondition,
    /// A referenced record does not exist
    MissingEntity,
    /// Storage, serialization or platform failure
    Infrastructure,
}

/// Unified error type for all ledger operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// An amount argument could not be parsed
    #[error("failed to parse {field}: {source}")]
    InvalidAmount {
        /// Which argument was being parsed
        field: String,
        /// Codec failure
        #[source]
        source: AmountError,
    },

    /// Any other malformed argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with it
        message: String,
    },

    /// Named operation invoked with the wrong number of arguments
    #[error("incorrect number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        /// Operation name
        function: String,
        /// Required count
        expected: usize,
        /// Supplied count
        actual: usize,
    },

    /// Mint, burn, transfer or lock with zero or negative amount
    #[error("{operation} amount must be positive")]
    NonPositiveAmount {
        /// Operation that rejected the amount
        operation: String,
    },

    /// Debit larger than the current balance
    #[error("insufficient balance for {address}: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Debited address
        address: String,
        /// Balance in atomic units
        available: String,
        /// Requested debit in atomic units
        requested: String,
    },

    /// Escrow operation not permitted from the contract's current status
    #[error("cannot {operation} contract {contract_id} in {status} status")]
    InvalidTransition {
        /// Escrow contract identifier
        contract_id: String,
        /// Attempted operation
        operation: String,
        /// Status the contract is in
        status: String,
    },

    /// Identifier already in use
    #[error("{what} already exists")]
    AlreadyExists {
        /// Description of the colliding record
        what: String,
    },

    /// Milestone identifier unknown to the contract
    #[error("milestone {milestone_id} not found in contract {contract_id}")]
    MilestoneNotFound {
        /// Escrow contract identifier
        contract_id: String,
        /// Requested milestone
        milestone_id: String,
    },

    /// Milestone exists but was already released or refunded
    #[error("milestone {milestone_id} is not in PENDING status ({status})")]
    MilestoneNotPending {
        /// Requested milestone
        milestone_id: String,
        /// Its current status
        status: String,
    },

    /// Token metadata missing when a mint requires it
    #[error("token metadata does not exist. Initialize first")]
    NotInitialized,

    /// Referenced record missing
    #[error("Not found: {message}")]
    NotFound {
        /// What was not found
        message: String,
    },

    /// World-state access failed
    #[error("Storage error: {0}")]
    Storage(#[from] StateError),

    /// Record or payload could not be encoded or decoded
    #[error("Serialization error: {message}")]
    Serialization {
        /// Decoder or encoder message
        message: String,
    },

    /// Caller identity could not be resolved
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Transaction timestamp unavailable
    #[error("Time error: {0}")]
    Time(#[from] TimeError),

    /// Event could not be emitted
    #[error("Event error: {0}")]
    Event(#[from] EventError),
}

impl LedgerError {
    /// Create an amount parse error for the named argument
    pub fn invalid_amount(field: impl Into<String>, source: AmountError) -> Self {
        Self::InvalidAmount {
            field: field.into(),
            source,
        }
    }

    /// Create a malformed argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a non-positive amount error
    pub fn non_positive(operation: impl Into<String>) -> Self {
        Self::NonPositiveAmount {
            operation: operation.into(),
        }
    }

    /// Create a duplicate identifier error
    pub fn already_exists(what: impl Into<String>) -> Self {
        Self::AlreadyExists { what: what.into() }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an illegal escrow transition error
    pub fn invalid_transition(
        contract_id: impl Into<String>,
        operation: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition {
            contract_id: contract_id.into(),
            operation: operation.into(),
            status: status.into(),
        }
    }

    /// Taxonomy class of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidAmount { .. } | Self::InvalidArgument { .. } | Self::ArgumentCount { .. } => {
                ErrorCategory::MalformedInput
            }
            Self::NonPositiveAmount { .. }
            | Self::InsufficientBalance { .. }
            | Self::InvalidTransition { .. }
            | Self::AlreadyExists { .. }
            | Self::MilestoneNotFound { .. }
            | Self::MilestoneNotPending { .. } => ErrorCategory::Precondition,
            Self::NotInitialized | Self::NotFound { .. } => ErrorCategory::MissingEntity,
            Self::Storage(_)
            | Self::Serialization { .. }
            | Self::Identity(_)
            | Self::Time(_)
            | Self::Event(_) => ErrorCategory::Infrastructure,
        }
    }
}

/// Standard Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
