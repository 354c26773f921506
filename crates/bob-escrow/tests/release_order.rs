//! Milestone release order does not affect the final status

use bob_escrow::{EscrowStatus, MilestoneStatus};
use bob_testkit::LedgerFixture;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn completes_exactly_when_last_milestone_released(
        order in (1usize..6).prop_flat_map(|n| Just((1..=n).collect::<Vec<_>>()).prop_shuffle())
    ) {
        let fixture = LedgerFixture::new();
        fixture.create_contract("c1", "p1", order.len());
        fixture.escrow(|e| e.lock_funds("c1", "1")).unwrap();

        for (released, index) in order.iter().enumerate() {
            let milestone_id = format!("m{index}");
            let contract = fixture
                .escrow(|e| e.release_milestone("c1", &milestone_id))
                .unwrap();

            let expected = if released + 1 == order.len() {
                EscrowStatus::Completed
            } else {
                EscrowStatus::InProgress
            };
            prop_assert_eq!(contract.status, expected);
            prop_assert_eq!(
                contract.milestones.iter().filter(|m| m.status == MilestoneStatus::Released).count(),
                released + 1
            );
        }
    }
}
