//! Named-operation dispatcher
//!
//! Maps an [`Invocation`] (function name plus positional string arguments)
//! onto the token ledger or the escrow engine. Mutating functions run in
//! their own transaction; queries read committed state directly.

use bob_core::effects::{EventEffects, IdentityEffects, TimeEffects, WorldStateEffects};
use bob_core::{LedgerError, Result};
use bob_effects::{execute, TransactionContext};
use bob_escrow::{ContractTerms, EscrowEngine, MilestoneTerms};
use bob_token::TokenLedger;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A function call by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Function name, e.g. `Mint`
    pub function: String,
    /// Positional arguments
    pub args: Vec<String>,
}

impl Invocation {
    /// Build an invocation
    pub fn new<I, S>(function: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            function: function.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// World-state namespace a function belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Token ledger
    Token,
    /// Escrow engine
    Escrow,
}

/// Every dispatchable function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// Write token metadata
    InitLedger,
    /// `to, amount`
    Mint,
    /// `from, amount`
    Burn,
    /// `from, to, amount`
    Transfer,
    /// `address`
    BalanceOf,
    /// no arguments
    TotalSupply,
    /// no arguments
    GetTokenInfo,
    /// `id, projectId, client, freelancer, totalAmount, milestonesJson`
    CreateContract,
    /// `id, amount`
    LockFunds,
    /// `id, milestoneId`
    ReleaseMilestone,
    /// `id`
    RefundProject,
    /// `id`
    GetContract,
    /// `projectId`
    GetContractsByProject,
}

impl Function {
    /// All functions in declaration order
    pub const ALL: [Function; 13] = [
        Self::InitLedger,
        Self::Mint,
        Self::Burn,
        Self::Transfer,
        Self::BalanceOf,
        Self::TotalSupply,
        Self::GetTokenInfo,
        Self::CreateContract,
        Self::LockFunds,
        Self::ReleaseMilestone,
        Self::RefundProject,
        Self::GetContract,
        Self::GetContractsByProject,
    ];

    /// Name used on the command line
    pub fn name(self) -> &'static str {
        match self {
            Self::InitLedger => "InitLedger",
            Self::Mint => "Mint",
            Self::Burn => "Burn",
            Self::Transfer => "Transfer",
            Self::BalanceOf => "BalanceOf",
            Self::TotalSupply => "TotalSupply",
            Self::GetTokenInfo => "GetTokenInfo",
            Self::CreateContract => "CreateContract",
            Self::LockFunds => "LockFunds",
            Self::ReleaseMilestone => "ReleaseMilestone",
            Self::RefundProject => "RefundProject",
            Self::GetContract => "GetContract",
            Self::GetContractsByProject => "GetContractsByProject",
        }
    }

    /// Exact number of arguments
    pub fn arity(self) -> usize {
        match self {
            Self::InitLedger | Self::TotalSupply | Self::GetTokenInfo => 0,
            Self::BalanceOf | Self::RefundProject | Self::GetContract | Self::GetContractsByProject => 1,
            Self::Mint | Self::Burn | Self::LockFunds | Self::ReleaseMilestone => 2,
            Self::Transfer => 3,
            Self::CreateContract => 6,
        }
    }

    /// Namespace whose state the function touches
    pub fn namespace(self) -> Namespace {
        match self {
            Self::InitLedger
            | Self::Mint
            | Self::Burn
            | Self::Transfer
            | Self::BalanceOf
            | Self::TotalSupply
            | Self::GetTokenInfo => Namespace::Token,
            _ => Namespace::Escrow,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Function {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|function| function.name() == s)
            .ok_or_else(|| LedgerError::invalid_argument(format!("unknown function {s}")))
    }
}

/// Handles the dispatcher runs invocations against
pub struct Dispatcher<'a> {
    token_state: &'a dyn WorldStateEffects,
    escrow_state: &'a dyn WorldStateEffects,
    clock: &'a dyn TimeEffects,
    identity: &'a dyn IdentityEffects,
    events: &'a dyn EventEffects,
}

impl<'a> Dispatcher<'a> {
    /// Wire up the two namespaces and platform handlers
    pub fn new(
        token_state: &'a dyn WorldStateEffects,
        escrow_state: &'a dyn WorldStateEffects,
        clock: &'a dyn TimeEffects,
        identity: &'a dyn IdentityEffects,
        events: &'a dyn EventEffects,
    ) -> Self {
        Self {
            token_state,
            escrow_state,
            clock,
            identity,
            events,
        }
    }

    /// Run `invocation`, returning its result as JSON (`null` for mutations
    /// without a meaningful result).
    ///
    /// The function's namespace picks the store it runs against.
    pub fn dispatch(&self, invocation: &Invocation) -> Result<Value> {
        let function: Function = invocation.function.parse()?;
        if invocation.args.len() != function.arity() {
            return Err(LedgerError::ArgumentCount {
                function: function.name().to_string(),
                expected: function.arity(),
                actual: invocation.args.len(),
            });
        }
        let namespace = function.namespace();
        debug!(%function, ?namespace, args = invocation.args.len(), "Dispatching invocation");

        let state = self.state(namespace);
        let args = &invocation.args;
        let arg = |i: usize| args[i].as_str();
        match function {
            Function::InitLedger => self
                .run(state, |tx| TokenLedger::new(tx).initialize())
                .map(|()| Value::Null),
            Function::Mint => self
                .run(state, |tx| TokenLedger::new(tx).mint(arg(0), arg(1)))
                .map(|()| Value::Null),
            Function::Burn => self
                .run(state, |tx| TokenLedger::new(tx).burn(arg(0), arg(1)))
                .map(|()| Value::Null),
            Function::Transfer => self
                .run(state, |tx| TokenLedger::new(tx).transfer(arg(0), arg(1), arg(2)))
                .map(|()| Value::Null),
            Function::BalanceOf => TokenLedger::new(state).balance_of(arg(0)).map(Value::String),
            Function::TotalSupply => TokenLedger::new(state).total_supply().map(Value::String),
            Function::GetTokenInfo => to_json(&TokenLedger::new(state).token_info()?),
            Function::CreateContract => {
                let milestones: Vec<MilestoneTerms> = serde_json::from_str(arg(5)).map_err(|e| {
                    LedgerError::invalid_argument(format!("failed to parse milestones: {e}"))
                })?;
                let terms = ContractTerms {
                    contract_id: arg(0).to_string(),
                    project_id: arg(1).to_string(),
                    client_address: arg(2).to_string(),
                    freelancer_address: arg(3).to_string(),
                    total_amount: arg(4).to_string(),
                    milestones,
                };
                to_json(&self.run(state, |tx| EscrowEngine::new(tx).create_contract(terms))?)
            }
            Function::LockFunds => {
                to_json(&self.run(state, |tx| EscrowEngine::new(tx).lock_funds(arg(0), arg(1)))?)
            }
            Function::ReleaseMilestone => to_json(
                &self.run(state, |tx| EscrowEngine::new(tx).release_milestone(arg(0), arg(1)))?,
            ),
            Function::RefundProject => {
                to_json(&self.run(state, |tx| EscrowEngine::new(tx).refund_project(arg(0)))?)
            }
            Function::GetContract => to_json(&EscrowEngine::new(state).get_contract(arg(0))?),
            Function::GetContractsByProject => {
                to_json(&EscrowEngine::new(state).get_contracts_by_project(arg(0))?)
            }
        }
    }

    /// Token ledger over committed state
    pub fn token_view(&self) -> TokenLedger<'a, dyn WorldStateEffects + 'a> {
        TokenLedger::new(self.state(Namespace::Token))
    }

    fn state(&self, namespace: Namespace) -> &'a dyn WorldStateEffects {
        match namespace {
            Namespace::Token => self.token_state,
            Namespace::Escrow => self.escrow_state,
        }
    }

    fn run<T>(
        &self,
        state: &dyn WorldStateEffects,
        op: impl FnOnce(&TransactionContext<'_>) -> Result<T>,
    ) -> Result<T> {
        execute(state, self.clock, self.identity, self.events, op)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use bob_effects::{EventLog, FixedClock, MemoryWorldState, StaticIdentity};

    struct Harness {
        token: MemoryWorldState,
        escrow: MemoryWorldState,
        clock: FixedClock,
        identity: StaticIdentity,
        events: EventLog,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                token: MemoryWorldState::new(),
                escrow: MemoryWorldState::new(),
                clock: FixedClock::default(),
                identity: StaticIdentity::new("Org1MSP"),
                events: EventLog::new(),
            }
        }

        fn call(&self, function: &str, args: &[&str]) -> Result<Value> {
            let dispatcher = Dispatcher::new(
                &self.token,
                &self.escrow,
                &self.clock,
                &self.identity,
                &self.events,
            );
            dispatcher.dispatch(&Invocation::new(function, args.iter().copied()))
        }
    }

    #[test]
    fn test_function_table() {
        for function in Function::ALL {
            assert_eq!(function.name().parse::<Function>().unwrap(), function);
        }
        assert_eq!(Function::CreateContract.arity(), 6);
        assert_eq!(Function::GetContract.namespace(), Namespace::Escrow);
        assert_eq!(Function::Transfer.namespace(), Namespace::Token);
    }

    #[test]
    fn test_unknown_function() {
        let h = Harness::new();
        assert_matches!(h.call("Steal", &[]), Err(LedgerError::InvalidArgument { .. }));
    }

    #[test]
    fn test_argument_count_checked() {
        let h = Harness::new();
        assert_matches!(
            h.call("Mint", &["alice"]),
            Err(LedgerError::ArgumentCount {
                expected: 2,
                actual: 1,
                ..
            })
        );
        assert_matches!(
            h.call("TotalSupply", &["extra"]),
            Err(LedgerError::ArgumentCount { .. })
        );
    }

    #[test]
    fn test_token_flow() {
        let h = Harness::new();
        assert_eq!(h.call("InitLedger", &[]).unwrap(), Value::Null);
        h.call("Mint", &["alice", "10"]).unwrap();
        h.call("Transfer", &["alice", "bob", "4"]).unwrap();

        assert_eq!(
            h.call("BalanceOf", &["bob"]).unwrap(),
            Value::String("4000000000000000000".into())
        );
        assert_eq!(
            h.call("TotalSupply", &[]).unwrap(),
            Value::String("10000000000000000000".into())
        );
        assert_eq!(h.call("GetTokenInfo", &[]).unwrap()["symbol"], "BOB");
    }

    #[test]
    fn test_escrow_flow() {
        let h = Harness::new();
        let milestones = r#"[{"milestoneId":"m1","description":"build","amount":"5"}]"#;
        let created = h
            .call("CreateContract", &["c1", "p1", "client", "dev", "5", milestones])
            .unwrap();
        assert_eq!(created["status"], "CREATED");

        h.call("LockFunds", &["c1", "5"]).unwrap();
        let released = h.call("ReleaseMilestone", &["c1", "m1"]).unwrap();
        assert_eq!(released["status"], "COMPLETED");

        let listed = h.call("GetContractsByProject", &["p1"]).unwrap();
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
        assert!(h.token.is_empty());
    }

    #[test]
    fn test_namespaces_route_to_their_own_store() {
        let h = Harness::new();
        h.call("InitLedger", &[]).unwrap();
        h.call("CreateContract", &["c1", "p1", "client", "dev", "1", "[]"]).unwrap();

        assert!(h.token.get_state("TOKEN_METADATA").unwrap().is_some());
        assert!(h.escrow.get_state("TOKEN_METADATA").unwrap().is_none());
        assert!(h.escrow.get_state("c1").unwrap().is_some());
        assert!(h.token.get_state("c1").unwrap().is_none());
        assert_matches!(h.call("GetContract", &["TOKEN_METADATA"]), Err(LedgerError::NotFound { .. }));
    }

    #[test]
    fn test_bad_milestones_json() {
        let h = Harness::new();
        let err = h
            .call("CreateContract", &["c1", "p1", "a", "b", "1", "not json"])
            .unwrap_err();
        assert!(err.to_string().contains("failed to parse milestones"));
        assert!(h.escrow.is_empty());
    }
}
