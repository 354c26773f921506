//! Ledger and escrow fixture

use bob_core::effects::TxTimestamp;
use bob_core::Result;
use bob_effects::{execute, EventLog, FixedClock, MemoryWorldState, StaticIdentity, TransactionContext};
use bob_escrow::{ContractTerms, EscrowContract, EscrowEngine, MilestoneTerms};
use bob_token::TokenLedger;
use chrono::TimeZone;

/// Identity every fixture caller resolves to
pub const TEST_IDENTITY: &str = "Org1MSP";

/// Token and escrow namespaces plus platform handlers, all in memory
#[derive(Debug, Clone)]
pub struct LedgerFixture {
    /// Token ledger namespace
    pub token_state: MemoryWorldState,
    /// Escrow namespace
    pub escrow_state: MemoryWorldState,
    /// Transaction clock
    pub clock: FixedClock,
    /// Caller identity
    pub identity: StaticIdentity,
    /// Committed events of both namespaces
    pub events: EventLog,
}

impl Default for LedgerFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerFixture {
    /// Empty namespaces, clock at 2024-01-01T00:00:00Z
    pub fn new() -> Self {
        Self {
            token_state: MemoryWorldState::new(),
            escrow_state: MemoryWorldState::new(),
            clock: FixedClock::new(fixture_epoch()),
            identity: StaticIdentity::new(TEST_IDENTITY),
            events: EventLog::new(),
        }
    }

    /// Fixture with token metadata already written
    pub fn initialized() -> Self {
        let fixture = Self::new();
        fixture.token(|ledger| ledger.initialize()).unwrap();
        fixture
    }

    /// Replace the caller identity
    pub fn with_identity(mut self, identity: StaticIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Run a token operation in its own transaction
    pub fn token<T>(
        &self,
        op: impl FnOnce(&TokenLedger<'_, TransactionContext<'_>>) -> Result<T>,
    ) -> Result<T> {
        execute(
            &self.token_state,
            &self.clock,
            &self.identity,
            &self.events,
            |tx| op(&TokenLedger::new(tx)),
        )
    }

    /// Run an escrow operation in its own transaction
    pub fn escrow<T>(
        &self,
        op: impl FnOnce(&EscrowEngine<'_, TransactionContext<'_>>) -> Result<T>,
    ) -> Result<T> {
        execute(
            &self.escrow_state,
            &self.clock,
            &self.identity,
            &self.events,
            |tx| op(&EscrowEngine::new(tx)),
        )
    }

    /// Read-only token queries against committed state
    pub fn token_view(&self) -> TokenLedger<'_, MemoryWorldState> {
        TokenLedger::new(&self.token_state)
    }

    /// Read-only escrow queries against committed state
    pub fn escrow_view(&self) -> EscrowEngine<'_, MemoryWorldState> {
        EscrowEngine::new(&self.escrow_state)
    }

    /// Committed balance of `address` in raw units
    pub fn balance(&self, address: &str) -> String {
        self.token_view().balance_of(address).unwrap()
    }

    /// Committed total supply
    pub fn supply(&self) -> String {
        self.token_view().total_supply().unwrap()
    }

    /// Committed contract
    pub fn contract(&self, contract_id: &str) -> EscrowContract {
        self.escrow_view().get_contract(contract_id).unwrap()
    }

    /// Create a contract with `milestones` milestones of one token each
    pub fn create_contract(&self, contract_id: &str, project_id: &str, milestones: usize) -> EscrowContract {
        let terms = contract_terms(contract_id, project_id, milestones);
        self.escrow(|engine| engine.create_contract(terms)).unwrap()
    }
}

/// Contract terms with `milestones` milestones `m1..mN` of one token each
pub fn contract_terms(contract_id: &str, project_id: &str, milestones: usize) -> ContractTerms {
    ContractTerms {
        contract_id: contract_id.to_string(),
        project_id: project_id.to_string(),
        client_address: "client".to_string(),
        freelancer_address: "freelancer".to_string(),
        total_amount: milestones.to_string(),
        milestones: (1..=milestones)
            .map(|i| MilestoneTerms::new(format!("m{i}"), format!("milestone {i}"), "1"))
            .collect(),
    }
}

/// Instant fixture clocks start at
pub fn fixture_epoch() -> TxTimestamp {
    chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}
