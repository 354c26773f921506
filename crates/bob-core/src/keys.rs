//! World-state key layout
//!
//! | Record         | Key                                      |
//! |----------------|------------------------------------------|
//! | Token metadata | `TOKEN_METADATA`                         |
//! | Balance        | `BALANCE_<address>`                      |
//! | Escrow         | `<contractId>` (escrow namespace)        |
//! | Project index  | `\0project\0<projectId>\0<contractId>\0` |
//!
//! Token and escrow records live in separate world-state namespaces, one
//! store handle each, so a contract id can never shadow a ledger key.

use crate::effects::{create_composite_key, COMPOSITE_KEY_SEPARATOR, MAX_UNICODE_RUNE};
use crate::errors::{LedgerError, Result};

/// Key of the singleton token metadata record.
pub const TOKEN_METADATA_KEY: &str = "TOKEN_METADATA";

/// Prefix of every balance record key.
pub const BALANCE_PREFIX: &str = "BALANCE_";

/// Composite-key object type of the project secondary index.
pub const PROJECT_INDEX: &str = "project";

/// Placeholder value stored under index keys.
pub const INDEX_MARKER: &[u8] = &[0x00];

/// Half-open key range `[start, end)` covering every balance record.
pub fn balance_range() -> (String, String) {
    (
        BALANCE_PREFIX.to_string(),
        format!("{BALANCE_PREFIX}{MAX_UNICODE_RUNE}"),
    )
}

/// Key of the balance record for `address`.
pub fn balance_key(address: &str) -> Result<String> {
    reject_reserved("address", address)?;
    Ok(format!("{BALANCE_PREFIX}{address}"))
}

/// Address encoded in a balance key, if it is one.
pub fn address_from_balance_key(key: &str) -> Option<&str> {
    key.strip_prefix(BALANCE_PREFIX)
}

/// Key of the escrow record for `contract_id`.
pub fn contract_key(contract_id: &str) -> Result<String> {
    if contract_id.is_empty() {
        return Err(LedgerError::invalid_argument("contract id must not be empty"));
    }
    reject_reserved("contract id", contract_id)?;
    Ok(contract_id.to_string())
}

/// Secondary index key linking `project_id` to `contract_id`.
pub fn project_index_key(project_id: &str, contract_id: &str) -> Result<String> {
    Ok(create_composite_key(PROJECT_INDEX, &[project_id, contract_id])?)
}

fn reject_reserved(what: &str, value: &str) -> Result<()> {
    if value.starts_with(COMPOSITE_KEY_SEPARATOR) || value.contains(MAX_UNICODE_RUNE) {
        return Err(LedgerError::invalid_argument(format!(
            "{what} {value:?} contains a reserved character"
        )));
    }
    Ok(())
}
