//! Token records

use bob_core::Amount;
use serde::{Deserialize, Serialize};

/// Token display name
pub const TOKEN_NAME: &str = "BobCoin";

/// Token ticker symbol
pub const TOKEN_SYMBOL: &str = "BOB";

/// Fractional digits of one whole token
pub const TOKEN_DECIMALS: u32 = bob_core::DECIMALS;

/// Token metadata singleton
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Display name
    pub name: String,
    /// Ticker symbol
    pub symbol: String,
    /// Fractional digits
    pub decimals: u32,
    /// Total supply in atomic units, exactly as stored
    pub total_supply: String,
}

impl Token {
    /// Metadata written by initialize: zero supply.
    pub fn genesis() -> Self {
        Self {
            name: TOKEN_NAME.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            decimals: TOKEN_DECIMALS,
            total_supply: "0".to_string(),
        }
    }
}

/// Balance of one address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Holder
    pub address: String,
    /// Holdings in atomic units
    pub amount: Amount,
}

/// Result of recomputing the supply from balances
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyAudit {
    /// Supply recorded in the metadata
    pub total_supply: Amount,
    /// Sum of every stored balance
    pub sum_of_balances: Amount,
    /// Number of balance records
    pub holders: usize,
    /// True when the two agree
    pub consistent: bool,
}
