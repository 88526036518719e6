//! Property-Based Test Data Generators
//!
//! proptest strategies for ledger value types, shared by the property
//! tests across crates.

use chrono::NaiveDate;
use proptest::prelude::*;

use core_kernel::{FolderNo, Money};

/// Strategy for positive Money amounts up to 1,000,000.00
pub fn positive_money() -> impl Strategy<Value = Money> {
    (1i64..=100_000_000i64).prop_map(Money::from_minor)
}

/// Strategy for non-negative Money amounts up to 1,000,000.00
pub fn non_negative_money() -> impl Strategy<Value = Money> {
    (0i64..=100_000_000i64).prop_map(Money::from_minor)
}

/// Strategy for signed Money amounts, for amendment deltas
pub fn signed_money() -> impl Strategy<Value = Money> {
    (-100_000_000i64..=100_000_000i64).prop_map(Money::from_minor)
}

/// Strategy for folder numbers, roots and date-change derivatives alike
pub fn folder_no() -> impl Strategy<Value = FolderNo> {
    (1u32..1_000_000u32, 0u32..=5u32).prop_map(|(root, derivative)| {
        let mut folder = FolderNo::new(root);
        for _ in 0..derivative {
            folder = folder.next_derivative();
        }
        folder
    })
}

/// Strategy for calendar dates within the ledger's working range
pub fn ledger_date() -> impl Strategy<Value = NaiveDate> {
    (2020i32..=2030i32, 1u32..=12u32, 1u32..=28u32)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).expect("day <= 28 always valid"))
}
