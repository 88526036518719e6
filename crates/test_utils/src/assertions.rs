//! Custom Test Assertions
//!
//! Assertion helpers for domain types that give more meaningful error
//! messages than bare `assert_eq!` on wrapped decimals.

use core_kernel::Money;

/// Asserts that two Money values differ by at most one minor unit
///
/// # Panics
///
/// Panics if the amounts differ by more than [`Money::tolerance`]
pub fn assert_money_approx_eq(actual: Money, expected: Money) {
    assert!(
        actual.approx_eq(expected),
        "Money amounts differ by more than one minor unit: actual={}, expected={}, diff={}",
        actual,
        expected,
        (actual - expected).abs()
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: Money) {
    assert!(money.is_zero(), "Expected zero money, got {}", money);
}

/// Asserts that a Money value is strictly positive
pub fn assert_money_positive(money: Money) {
    assert!(
        money.is_positive(),
        "Expected positive money, got {}",
        money
    );
}

/// Asserts that a Money value is strictly negative
pub fn assert_money_negative(money: Money) {
    assert!(
        money.is_negative(),
        "Expected negative money, got {}",
        money
    );
}

/// Asserts that the parts sum exactly to the total
pub fn assert_money_sums_to(parts: &[Money], total: Money) {
    let sum: Money = parts.iter().copied().sum();
    assert_eq!(
        sum, total,
        "Parts sum to {} but expected total {}",
        sum, total
    );
}
