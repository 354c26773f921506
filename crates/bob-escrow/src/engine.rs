//! Escrow engine operations
//!
//! Each mutator reads the contract, checks the transition, writes the
//! updated record and publishes one event. Run mutators through
//! `bob_effects::execute`; a rejected transition leaves the record as it was.

use bob_core::effects::{split_composite_key, to_rfc3339, LedgerEffects, WorldStateEffects};
use bob_core::keys::{contract_key, project_index_key, INDEX_MARKER, PROJECT_INDEX};
use bob_core::{parse_amount, publish, Amount, LedgerError, LedgerEvent, Result, StateError};
use tracing::{debug, info, warn};

use crate::types::{
    ContractTerms, EscrowContract, EscrowStatus, Milestone, MilestoneStatus, MilestoneTerms,
};

/// Escrow engine over an injected effect handle
pub struct EscrowEngine<'a, E: ?Sized> {
    effects: &'a E,
}

impl<'a, E: ?Sized> EscrowEngine<'a, E> {
    /// Bind the engine to `effects`
    pub fn new(effects: &'a E) -> Self {
        Self { effects }
    }
}

impl<E: WorldStateEffects + ?Sized> EscrowEngine<'_, E> {
    /// Contract stored under `contract_id`.
    pub fn get_contract(&self, contract_id: &str) -> Result<EscrowContract> {
        let key = contract_key(contract_id)?;
        let raw = self
            .effects
            .get_state(&key)?
            .ok_or_else(|| LedgerError::not_found(format!("contract {contract_id} does not exist")))?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Every contract indexed under `project_id`, in contract id order.
    ///
    /// Index entries whose contract record is missing are skipped.
    pub fn get_contracts_by_project(&self, project_id: &str) -> Result<Vec<EscrowContract>> {
        let entries = self
            .effects
            .scan_partial_composite_key(PROJECT_INDEX, &[project_id])?;

        let mut contracts = Vec::with_capacity(entries.len());
        for (key, _) in entries {
            let (_, parts) = split_composite_key(&key)?;
            let contract_id = parts.get(1).ok_or_else(|| StateError::InvalidKey {
                reason: format!("project index key {key:?} has no contract id"),
            })?;
            match self.get_contract(contract_id) {
                Ok(contract) => contracts.push(contract),
                Err(LedgerError::NotFound { .. }) => {
                    warn!(project_id, contract_id = %contract_id, "Skipping dangling project index entry");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(contracts)
    }
}

impl<E: LedgerEffects + ?Sized> EscrowEngine<'_, E> {
    /// Record a new contract and its project index entry.
    pub fn create_contract(&self, terms: ContractTerms) -> Result<EscrowContract> {
        debug!(
            contract_id = %terms.contract_id,
            project_id = %terms.project_id,
            milestones = terms.milestones.len(),
            "Creating escrow contract"
        );

        let key = contract_key(&terms.contract_id)?;
        let index_key = project_index_key(&terms.project_id, &terms.contract_id)?;
        if self.effects.get_state(&key)?.is_some() {
            return Err(LedgerError::already_exists(format!(
                "contract {}",
                terms.contract_id
            )));
        }

        let total_amount = amount_field("total amount", &terms.total_amount)?;
        let milestones = pending_milestones(terms.milestones)?;
        let now = to_rfc3339(&self.effects.transaction_timestamp()?);

        let contract = EscrowContract {
            contract_id: terms.contract_id,
            project_id: terms.project_id,
            client_address: terms.client_address,
            freelancer_address: terms.freelancer_address,
            total_amount,
            locked_amount: Amount::zero(),
            status: EscrowStatus::Created,
            milestones,
            created_at: now.clone(),
            updated_at: now,
        };

        self.write_contract(&contract)?;
        self.effects.put_state(&index_key, INDEX_MARKER.to_vec())?;
        publish(
            self.effects,
            &LedgerEvent::ContractCreated {
                contract_id: contract.contract_id.clone(),
                project_id: contract.project_id.clone(),
            },
        )?;
        info!(contract_id = %contract.contract_id, "Escrow contract created");
        Ok(contract)
    }

    /// Record `amount` as the locked amount and mark the contract funded.
    ///
    /// A second lock replaces the first; amounts do not accumulate.
    pub fn lock_funds(&self, contract_id: &str, amount: &str) -> Result<EscrowContract> {
        debug!(contract_id, amount, "Locking escrow funds");

        let mut contract = self.get_contract(contract_id)?;
        if !contract.status.can_lock() {
            return Err(LedgerError::invalid_transition(
                contract_id,
                "lock funds for",
                contract.status.as_str(),
            ));
        }

        let locked = parse_amount(amount).map_err(|e| LedgerError::invalid_amount("lock amount", e))?;
        if !locked.is_positive() {
            return Err(LedgerError::non_positive("lock"));
        }

        contract.locked_amount = locked;
        contract.status = EscrowStatus::Funded;
        contract.updated_at = self.now()?;
        self.write_contract(&contract)?;

        publish(
            self.effects,
            &LedgerEvent::FundsLocked {
                contract_id: contract_id.to_string(),
                amount: amount.to_string(),
            },
        )?;
        info!(contract_id, locked = %contract.locked_amount.to_units_string(), "Escrow funds locked");
        Ok(contract)
    }

    /// Release one pending milestone.
    pub fn release_milestone(&self, contract_id: &str, milestone_id: &str) -> Result<EscrowContract> {
        debug!(contract_id, milestone_id, "Releasing milestone");

        let mut contract = self.get_contract(contract_id)?;
        if !contract.status.can_release() {
            return Err(LedgerError::invalid_transition(
                contract_id,
                "release milestone of",
                contract.status.as_str(),
            ));
        }

        let now = self.now()?;
        let milestone = contract
            .milestones
            .iter_mut()
            .find(|m| m.milestone_id == milestone_id)
            .ok_or_else(|| LedgerError::MilestoneNotFound {
                contract_id: contract_id.to_string(),
                milestone_id: milestone_id.to_string(),
            })?;
        if milestone.status != MilestoneStatus::Pending {
            return Err(LedgerError::MilestoneNotPending {
                milestone_id: milestone_id.to_string(),
                status: milestone.status.as_str().to_string(),
            });
        }
        milestone.status = MilestoneStatus::Released;
        milestone.released_at = Some(now.clone());

        contract.status = if contract.all_released() {
            EscrowStatus::Completed
        } else {
            EscrowStatus::InProgress
        };
        contract.updated_at = now;
        self.write_contract(&contract)?;

        publish(
            self.effects,
            &LedgerEvent::MilestoneReleased {
                contract_id: contract_id.to_string(),
                milestone_id: milestone_id.to_string(),
            },
        )?;
        info!(
            contract_id,
            milestone_id,
            status = %contract.status,
            released = %contract.released_amount().to_units_string(),
            "Milestone released"
        );
        Ok(contract)
    }

    /// Refund the contract, cancelling every pending milestone.
    ///
    /// Released milestones keep their status.
    pub fn refund_project(&self, contract_id: &str) -> Result<EscrowContract> {
        debug!(contract_id, "Refunding escrow contract");

        let mut contract = self.get_contract(contract_id)?;
        if !contract.status.can_refund() {
            return Err(LedgerError::invalid_transition(
                contract_id,
                "refund",
                contract.status.as_str(),
            ));
        }

        let cancelled = contract.pending_amount();
        for milestone in &mut contract.milestones {
            if milestone.status == MilestoneStatus::Pending {
                milestone.status = MilestoneStatus::Refunded;
            }
        }
        contract.status = EscrowStatus::Refunded;
        contract.updated_at = self.now()?;
        self.write_contract(&contract)?;

        publish(
            self.effects,
            &LedgerEvent::ProjectRefunded {
                contract_id: contract_id.to_string(),
                amount: contract.locked_amount.to_units_string(),
            },
        )?;
        info!(
            contract_id,
            cancelled = %cancelled.to_units_string(),
            "Escrow contract refunded"
        );
        Ok(contract)
    }

    fn now(&self) -> Result<String> {
        Ok(to_rfc3339(&self.effects.transaction_timestamp()?))
    }

    fn write_contract(&self, contract: &EscrowContract) -> Result<()> {
        let key = contract_key(&contract.contract_id)?;
        self.effects.put_state(&key, serde_json::to_vec(contract)?)?;
        Ok(())
    }
}

fn amount_field(field: &str, input: &str) -> Result<Amount> {
    parse_amount(input).map_err(|e| LedgerError::invalid_amount(field, e))
}

fn pending_milestones(terms: Vec<MilestoneTerms>) -> Result<Vec<Milestone>> {
    terms
        .into_iter()
        .map(|term| {
            let amount = amount_field(&format!("milestone {} amount", term.milestone_id), &term.amount)?;
            Ok(Milestone {
                milestone_id: term.milestone_id,
                description: term.description,
                amount,
                status: MilestoneStatus::Pending,
                released_at: None,
            })
        })
        .collect()
}
