//! Token ledger operations
//!
//! Queries need only world-state access. Mutators additionally need the
//! caller identity, the event sink and a surrounding transaction; run them
//! through `bob_effects::execute` so a failure leaves no partial writes.

use bob_core::effects::{LedgerEffects, WorldStateEffects};
use bob_core::keys::{address_from_balance_key, balance_key, balance_range, TOKEN_METADATA_KEY};
use bob_core::{parse_amount, publish, Amount, LedgerError, LedgerEvent, Result};
use tracing::{debug, info, warn};

use crate::types::{Balance, SupplyAudit, Token};

/// Token ledger over an injected effect handle
pub struct TokenLedger<'a, E: ?Sized> {
    effects: &'a E,
}

impl<'a, E: ?Sized> TokenLedger<'a, E> {
    /// Bind the ledger to `effects`
    pub fn new(effects: &'a E) -> Self {
        Self { effects }
    }
}

impl<E: WorldStateEffects + ?Sized> TokenLedger<'_, E> {
    /// Balance of `address` as a raw unscaled integer string, `"0"` if absent.
    pub fn balance_of(&self, address: &str) -> Result<String> {
        Ok(self.read_balance(address)?.to_units_string())
    }

    /// Total supply exactly as stored, `"0"` before initialization.
    pub fn total_supply(&self) -> Result<String> {
        Ok(self
            .read_token()?
            .map_or_else(|| "0".to_string(), |token| token.total_supply))
    }

    /// Token metadata.
    pub fn token_info(&self) -> Result<Token> {
        self.read_token()?
            .ok_or_else(|| LedgerError::not_found("token metadata does not exist"))
    }

    /// Every stored balance in address order.
    pub fn holders(&self) -> Result<Vec<Balance>> {
        let (start, end) = balance_range();
        self.effects
            .range_scan(&start, &end)?
            .into_iter()
            .map(|(key, raw)| {
                let balance: Balance = serde_json::from_slice(&raw)?;
                if address_from_balance_key(&key) != Some(balance.address.as_str()) {
                    warn!(key = %key, address = %balance.address, "Balance record address mismatch");
                }
                Ok(balance)
            })
            .collect()
    }

    /// Recompute the supply from balances and compare with the metadata.
    pub fn audit_supply(&self) -> Result<SupplyAudit> {
        let total_supply = match self.read_token()? {
            Some(token) => stored_amount("total supply", &token.total_supply)?,
            None => Amount::zero(),
        };
        let holders = self.holders()?;
        let sum_of_balances: Amount = holders.iter().map(|b| &b.amount).sum();
        let consistent = total_supply == sum_of_balances;
        if !consistent {
            warn!(
                total_supply = %total_supply.to_units_string(),
                sum_of_balances = %sum_of_balances.to_units_string(),
                "Supply does not match balances"
            );
        }
        Ok(SupplyAudit {
            total_supply,
            sum_of_balances,
            holders: holders.len(),
            consistent,
        })
    }

    fn read_token(&self) -> Result<Option<Token>> {
        match self.effects.get_state(TOKEN_METADATA_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    fn read_balance(&self, address: &str) -> Result<Amount> {
        let key = balance_key(address)?;
        match self.effects.get_state(&key)? {
            Some(raw) => {
                let balance: Balance = serde_json::from_slice(&raw)?;
                Ok(balance.amount)
            }
            None => Ok(Amount::zero()),
        }
    }
}

impl<E: LedgerEffects + ?Sized> TokenLedger<'_, E> {
    /// Write the genesis metadata record.
    pub fn initialize(&self) -> Result<()> {
        if self.effects.get_state(TOKEN_METADATA_KEY)?.is_some() {
            return Err(LedgerError::already_exists("token metadata"));
        }
        self.write_token(&Token::genesis())?;
        info!("Token ledger initialized");
        Ok(())
    }

    /// Create `amount` tokens and credit them to `to`.
    pub fn mint(&self, to: &str, amount: &str) -> Result<()> {
        let caller = self.effects.caller_identity()?;
        debug!(caller = %caller, to, amount, "Minting tokens");

        balance_key(to)?;
        let value = input_amount("mint amount", amount)?;
        require_positive("mint", &value)?;
        let mut token = self.read_token()?.ok_or(LedgerError::NotInitialized)?;

        let supply = stored_amount("current supply", &token.total_supply)? + value.clone();
        let balance = self.read_balance(to)? + value;

        token.total_supply = supply.to_units_string();
        self.write_token(&token)?;
        self.write_balance(to, balance)?;

        publish(
            self.effects,
            &LedgerEvent::Mint {
                to: to.to_string(),
                amount: amount.to_string(),
                total_supply: token.total_supply.clone(),
            },
        )?;
        info!(to, total_supply = %token.total_supply, "Minted tokens");
        Ok(())
    }

    /// Destroy `amount` tokens held by `from`.
    pub fn burn(&self, from: &str, amount: &str) -> Result<()> {
        debug!(from, amount, "Burning tokens");

        let value = input_amount("burn amount", amount)?;
        require_positive("burn", &value)?;
        let balance = self.read_balance(from)?;
        require_covered(from, &balance, &value)?;

        // Absent metadata surfaces as a decode failure of the empty record.
        let raw = self.effects.get_state(TOKEN_METADATA_KEY)?;
        let mut token: Token = serde_json::from_slice(&raw.unwrap_or_default())?;
        let supply = stored_amount("total supply", &token.total_supply)?;

        token.total_supply = (&supply - &value).to_units_string();
        self.write_balance(from, &balance - &value)?;
        self.write_token(&token)?;

        publish(
            self.effects,
            &LedgerEvent::Burn {
                from: from.to_string(),
                amount: amount.to_string(),
                total_supply: token.total_supply.clone(),
            },
        )?;
        info!(from, total_supply = %token.total_supply, "Burned tokens");
        Ok(())
    }

    /// Move `amount` tokens from `from` to `to`.
    pub fn transfer(&self, from: &str, to: &str, amount: &str) -> Result<()> {
        debug!(from, to, amount, "Transferring tokens");

        balance_key(to)?;
        let value = input_amount("transfer amount", amount)?;
        require_positive("transfer", &value)?;
        let sender = self.read_balance(from)?;
        require_covered(from, &sender, &value)?;

        self.write_balance(from, &sender - &value)?;
        // Re-read so a self-transfer credits the debited balance.
        let recipient = self.read_balance(to)?;
        self.write_balance(to, recipient + value)?;

        publish(
            self.effects,
            &LedgerEvent::Transfer {
                from: from.to_string(),
                to: to.to_string(),
                amount: amount.to_string(),
            },
        )?;
        info!(from, to, "Transferred tokens");
        Ok(())
    }

    fn write_token(&self, token: &Token) -> Result<()> {
        let bytes = serde_json::to_vec(token)?;
        self.effects.put_state(TOKEN_METADATA_KEY, bytes)?;
        Ok(())
    }

    fn write_balance(&self, address: &str, amount: Amount) -> Result<()> {
        let key = balance_key(address)?;
        let record = Balance {
            address: address.to_string(),
            amount,
        };
        self.effects.put_state(&key, serde_json::to_vec(&record)?)?;
        Ok(())
    }
}

fn input_amount(field: &str, input: &str) -> Result<Amount> {
    parse_amount(input).map_err(|e| LedgerError::invalid_amount(field, e))
}

fn stored_amount(field: &str, raw: &str) -> Result<Amount> {
    Amount::from_stored(raw).map_err(|e| LedgerError::invalid_amount(field, e))
}

fn require_positive(operation: &str, value: &Amount) -> Result<()> {
    if value.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::non_positive(operation))
    }
}

fn require_covered(address: &str, balance: &Amount, value: &Amount) -> Result<()> {
    if balance < value {
        return Err(LedgerError::InsufficientBalance {
            address: address.to_string(),
            available: balance.to_units_string(),
            requested: value.to_units_string(),
        });
    }
    Ok(())
}
