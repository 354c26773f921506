//! Property test strategies for ledger inputs
//!
//! Addresses are drawn from a small pool so generated operation sequences
//! hit the same balances repeatedly.

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

/// Address pool used by [`arb_address`]
pub const ADDRESSES: &[&str] = &["alice", "bob", "carol", "dave"];

/// One of a handful of fixed addresses
pub fn arb_address() -> impl Strategy<Value = String> {
    proptest::sample::select(ADDRESSES).prop_map(str::to_string)
}

/// Positive decimal amount with up to 18 fractional digits
pub fn arb_positive_amount() -> impl Strategy<Value = String> {
    (0u64..1_000, proptest::option::of("[0-9]{1,18}"))
        .prop_filter_map("amount must be positive", |(whole, fraction)| {
            let text = match fraction {
                Some(digits) => format!("{whole}.{digits}"),
                None => whole.to_string(),
            };
            let positive = text.bytes().any(|b| (b'1'..=b'9').contains(&b));
            positive.then_some(text)
        })
}

/// Any decimal string the codec accepts, including zero and negatives
pub fn arb_decimal_amount() -> impl Strategy<Value = String> {
    (any::<bool>(), arb_positive_amount()).prop_map(|(negative, body)| {
        if negative {
            format!("-{body}")
        } else {
            body
        }
    })
}

/// A token ledger mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOp {
    /// Mint to an address
    Mint {
        /// Recipient
        to: String,
        /// Decimal amount
        amount: String,
    },
    /// Burn from an address
    Burn {
        /// Holder
        from: String,
        /// Decimal amount
        amount: String,
    },
    /// Transfer between addresses
    Transfer {
        /// Sender
        from: String,
        /// Recipient
        to: String,
        /// Decimal amount
        amount: String,
    },
}

/// A single ledger mutation with a positive amount
pub fn arb_ledger_op() -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        2 => (arb_address(), arb_positive_amount()).prop_map(|(to, amount)| LedgerOp::Mint { to, amount }),
        1 => (arb_address(), arb_positive_amount()).prop_map(|(from, amount)| LedgerOp::Burn { from, amount }),
        2 => (arb_address(), arb_address(), arb_positive_amount())
            .prop_map(|(from, to, amount)| LedgerOp::Transfer { from, to, amount }),
    ]
}

/// Sequence of up to `max_len` ledger mutations
pub fn arb_ledger_ops(max_len: usize) -> impl Strategy<Value = Vec<LedgerOp>> {
    proptest::collection::vec(arb_ledger_op(), 0..=max_len)
}
