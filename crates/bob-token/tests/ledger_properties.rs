//! Token ledger behaviour through committed transactions

use assert_matches::assert_matches;
use bob_core::{parse_amount, Amount, LedgerError};
use bob_effects::StaticIdentity;
use bob_testkit::strategies::{arb_ledger_ops, LedgerOp};
use bob_testkit::LedgerFixture;
use proptest::prelude::*;

fn units(raw: &str) -> Amount {
    Amount::parse_units(raw).unwrap()
}

#[test]
fn mint_updates_supply_and_balances() {
    let fixture = LedgerFixture::initialized();
    fixture.token(|l| l.mint("A", "10")).unwrap();
    fixture.token(|l| l.mint("B", "5")).unwrap();

    assert_eq!(fixture.supply(), "15000000000000000000");
    assert_eq!(
        units(&fixture.balance("A")) + units(&fixture.balance("B")),
        units(&fixture.supply())
    );
}

#[test]
fn mint_event_carries_input_amount() {
    let fixture = LedgerFixture::initialized();
    fixture.token(|l| l.mint("alice", "2.50")).unwrap();

    let event = fixture.events.last().unwrap();
    assert_eq!(event.name, "Mint");
    assert_eq!(
        event.json(),
        serde_json::json!({
            "type": "Mint",
            "to": "alice",
            "amount": "2.50",
            "totalSupply": "2500000000000000000"
        })
    );
}

#[test]
fn over_burn_changes_nothing() {
    let fixture = LedgerFixture::initialized();
    fixture.token(|l| l.mint("A", "1")).unwrap();
    let before = fixture.token_state.snapshot();
    let events_before = fixture.events.recorded().len();

    let result = fixture.token(|l| l.burn("A", "2"));
    assert_matches!(result, Err(LedgerError::InsufficientBalance { .. }));
    assert_eq!(fixture.token_state.snapshot(), before);
    assert_eq!(fixture.events.recorded().len(), events_before);
}

#[test]
fn burn_reduces_supply() {
    let fixture = LedgerFixture::initialized();
    fixture.token(|l| l.mint("A", "3")).unwrap();
    fixture.token(|l| l.burn("A", "1.25")).unwrap();

    assert_eq!(fixture.balance("A"), "1750000000000000000");
    assert_eq!(fixture.supply(), "1750000000000000000");
    assert_eq!(fixture.events.names(), vec!["Mint", "Burn"]);
}

#[test]
fn round_trip_transfer_restores_balances() {
    let fixture = LedgerFixture::initialized();
    fixture.token(|l| l.mint("A", "7")).unwrap();
    fixture.token(|l| l.mint("B", "1")).unwrap();
    let (a, b) = (fixture.balance("A"), fixture.balance("B"));

    fixture.token(|l| l.transfer("A", "B", "3.3")).unwrap();
    fixture.token(|l| l.transfer("B", "A", "3.3")).unwrap();

    assert_eq!(fixture.balance("A"), a);
    assert_eq!(fixture.balance("B"), b);
}

#[test]
fn transfer_requires_sender_funds() {
    let fixture = LedgerFixture::initialized();
    let result = fixture.token(|l| l.transfer("nobody", "B", "1"));
    assert_matches!(result, Err(LedgerError::InsufficientBalance { address, .. }) if address == "nobody");
    assert_eq!(fixture.balance("B"), "0");
}

#[test]
fn mint_requires_caller_identity() {
    let fixture = LedgerFixture::initialized().with_identity(StaticIdentity::unresolved());
    assert_matches!(
        fixture.token(|l| l.mint("A", "1")),
        Err(LedgerError::Identity(_))
    );
    assert_eq!(fixture.supply(), "0");
}

#[test]
fn token_info_after_initialize() {
    let fixture = LedgerFixture::initialized();
    let info = fixture.token_view().token_info().unwrap();
    assert_eq!(info.name, "BobCoin");
    assert_eq!(info.symbol, "BOB");
    assert_eq!(info.decimals, 18);
    assert_eq!(info.total_supply, "0");
}

#[test]
fn holders_lists_balances_in_address_order() {
    let fixture = LedgerFixture::initialized();
    fixture.token(|l| l.mint("carol", "1")).unwrap();
    fixture.token(|l| l.mint("alice", "2")).unwrap();

    let holders = fixture.token_view().holders().unwrap();
    let addresses: Vec<_> = holders.iter().map(|h| h.address.as_str()).collect();
    assert_eq!(addresses, vec!["alice", "carol"]);
}

#[test]
fn empty_address_holds_a_balance() {
    let fixture = LedgerFixture::initialized();
    fixture.token(|l| l.mint("", "1")).unwrap();
    fixture.token(|l| l.transfer("", "bob", "0.25")).unwrap();

    assert_eq!(fixture.balance(""), "750000000000000000");
    assert!(fixture.token_view().audit_supply().unwrap().consistent);
}

#[test]
fn parallel_mints_on_shared_fixture_conserve_supply() {
    let fixture = LedgerFixture::initialized();
    let workers: Vec<_> = ["w0", "w1", "w2", "w3"]
        .into_iter()
        .map(|who| {
            let fixture = fixture.clone();
            std::thread::spawn(move || {
                for _ in 0..250 {
                    fixture.token(|l| l.mint(who, "1")).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let audit = fixture.token_view().audit_supply().unwrap();
    assert!(audit.consistent);
    assert_eq!(audit.total_supply, units("1000000000000000000000"));
    assert_eq!(fixture.balance("w2"), "250000000000000000000");
}

fn apply(fixture: &LedgerFixture, op: &LedgerOp) -> bob_core::Result<()> {
    match op {
        LedgerOp::Mint { to, amount } => fixture.token(|l| l.mint(to, amount)),
        LedgerOp::Burn { from, amount } => fixture.token(|l| l.burn(from, amount)),
        LedgerOp::Transfer { from, to, amount } => fixture.token(|l| l.transfer(from, to, amount)),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn supply_always_equals_sum_of_balances(ops in arb_ledger_ops(24)) {
        let fixture = LedgerFixture::initialized();
        let mut expected_supply = Amount::zero();

        for op in &ops {
            let result = apply(&fixture, op);
            match (op, &result) {
                (LedgerOp::Mint { amount, .. }, Ok(())) => {
                    expected_supply = expected_supply + parse_amount(amount).unwrap();
                }
                (LedgerOp::Burn { amount, .. }, Ok(())) => {
                    expected_supply = expected_supply - parse_amount(amount).unwrap();
                }
                (_, Ok(())) => {}
                (_, Err(err)) => {
                    prop_assert!(
                        matches!(err, LedgerError::InsufficientBalance { .. }),
                        "unexpected error {err}"
                    );
                }
            }

            let audit = fixture.token_view().audit_supply().unwrap();
            prop_assert!(audit.consistent);
            prop_assert_eq!(&audit.total_supply, &expected_supply);
        }
    }
}
