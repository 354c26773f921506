//! Subcommand handlers

use anyhow::{Context, Result};
use bob_core::effects::TimeEffects;
use bob_core::{format_amount, parse_amount, Amount};
use bob_effects::{EventLog, FileWorldState, FixedClock, StaticIdentity, SystemClock};
use bob_token::SupplyAudit;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::config::CliConfig;
use crate::dispatch::{Dispatcher, Invocation};

/// File-backed ledger opened from a [`CliConfig`]
pub struct LocalLedger {
    token_state: FileWorldState,
    escrow_state: FileWorldState,
    clock: Box<dyn TimeEffects>,
    identity: StaticIdentity,
    events: EventLog,
}

impl LocalLedger {
    /// Open both namespace snapshots under the configured data directory
    pub fn open(config: &CliConfig) -> Result<Self> {
        let token_path = config.token_state_path();
        let escrow_path = config.escrow_state_path();
        let token_state = FileWorldState::open(&token_path)
            .with_context(|| format!("opening {}", token_path.display()))?;
        let escrow_state = FileWorldState::open(&escrow_path)
            .with_context(|| format!("opening {}", escrow_path.display()))?;

        let clock: Box<dyn TimeEffects> = match config.fixed_timestamp()? {
            Some(at) => Box::new(FixedClock::new(at)),
            None => Box::new(SystemClock),
        };
        let identity = if config.identity.is_empty() {
            StaticIdentity::unresolved()
        } else {
            StaticIdentity::new(config.identity.clone())
        };

        Ok(Self {
            token_state,
            escrow_state,
            clock,
            identity,
            events: EventLog::new(),
        })
    }

    /// Dispatcher over this ledger's handlers
    pub fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher::new(
            &self.token_state,
            &self.escrow_state,
            self.clock.as_ref(),
            &self.identity,
            &self.events,
        )
    }

    /// Events committed since the ledger was opened
    pub fn events(&self) -> &EventLog {
        &self.events
    }
}

/// Emitted event as printed by `invoke`
#[derive(Debug, Serialize)]
pub struct EventOutput {
    /// Event name
    pub name: String,
    /// Decoded payload
    pub payload: Value,
}

/// Result of `invoke`
#[derive(Debug, Serialize)]
pub struct InvokeOutput {
    /// Function result
    pub result: Value,
    /// Events committed by the call
    pub events: Vec<EventOutput>,
}

/// Run one named function against the local ledger
pub fn invoke(config: &CliConfig, function: &str, args: Vec<String>) -> Result<InvokeOutput> {
    let ledger = LocalLedger::open(config)?;
    let invocation = Invocation::new(function, args);
    let result = ledger
        .dispatcher()
        .dispatch(&invocation)
        .with_context(|| format!("{function} failed"))?;

    let events = ledger
        .events()
        .drain()
        .into_iter()
        .map(|event| EventOutput {
            payload: event.json(),
            name: event.name,
        })
        .collect::<Vec<_>>();
    info!(function, events = events.len(), "Invocation committed");
    Ok(InvokeOutput { result, events })
}

/// Decimal string to raw units
pub fn parse(input: &str) -> Result<String> {
    let amount = parse_amount(input).with_context(|| format!("parsing {input:?}"))?;
    Ok(amount.to_units_string())
}

/// Raw units to decimal string
pub fn format(units: &str) -> Result<String> {
    let amount = Amount::parse_units(units).with_context(|| format!("reading units {units:?}"))?;
    Ok(format_amount(&amount))
}

/// Recompute supply against balances
pub fn audit(config: &CliConfig) -> Result<SupplyAudit> {
    let ledger = LocalLedger::open(config)?;
    let audit = ledger.dispatcher().token_view().audit_supply()?;
    Ok(audit)
}
