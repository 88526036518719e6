//! Money with precise decimal arithmetic
//!
//! All amounts in the ledger share one currency and are stored with
//! 2 decimal places. rust_decimal keeps the arithmetic exact; the
//! rounding policy lives here so no other module rounds on its own.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use thiserror::Error;

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Division by zero")]
    DivisionByZero,
}

/// A monetary amount, normalised to 2 decimal places
///
/// Amounts are signed: balances and payments are non-negative by
/// validation at the call sites, while amendment deltas and commission
/// clawbacks legitimately go negative.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a new Money value, rounding to 2 decimal places
    pub fn new(amount: Decimal) -> Self {
        Self(amount.round_dp(2))
    }

    /// Creates Money from an integer amount of minor units (cents)
    pub fn from_minor(minor_units: i64) -> Self {
        Self(Decimal::new(minor_units, 2))
    }

    /// The zero amount
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Comparison tolerance for caller-supplied totals: one minor unit
    pub fn tolerance() -> Self {
        Self(dec!(0.01))
    }

    /// Returns the underlying decimal amount
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Returns the absolute value
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// True when the two amounts differ by at most one minor unit
    pub fn approx_eq(&self, other: Money) -> bool {
        (*self - other).abs() <= Self::tolerance()
    }

    /// Multiplies by a scalar (e.g. a commission rate)
    pub fn multiply(&self, factor: Decimal) -> Self {
        Self::new(self.0 * factor)
    }

    /// Splits the amount into `n` equal shares of 2 decimal places.
    ///
    /// Shares are computed by floor division in minor units, so no share
    /// ever exceeds the even split; the remainder (at most `n - 1` minor
    /// units) is folded into the **last** share and the shares always sum
    /// exactly to the original amount.
    pub fn split_equal(&self, n: u32) -> Result<Vec<Money>, MoneyError> {
        if n == 0 {
            return Err(MoneyError::DivisionByZero);
        }
        if self.is_negative() {
            return Err(MoneyError::InvalidAmount(format!(
                "cannot split negative amount {}",
                self
            )));
        }

        // Amounts are normalised to 2 dp, so this is an exact integer
        let minor = (self.0 * dec!(100))
            .to_i64()
            .ok_or_else(|| MoneyError::InvalidAmount(format!("amount {} out of range", self)))?;
        let base = minor / i64::from(n);
        let remainder = minor - base * i64::from(n);

        let mut shares = vec![Self::from_minor(base); n as usize];
        shares[n as usize - 1] = Self::from_minor(base + remainder);

        Ok(shares)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.0 - other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, factor: Decimal) -> Self {
        self.multiply(factor)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// A commission rate (e.g. 0.5 for a half-profit initial commission)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate(Decimal);

impl Rate {
    /// Creates a rate from a decimal fraction (0.5 for 50%)
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Half-profit rate used for INTERNAL bookings at creation time
    pub fn half() -> Self {
        Self(dec!(0.5))
    }

    /// Full-profit rate used for FULL bookings
    pub fn full() -> Self {
        Self(dec!(1.0))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Applies this rate to an amount
    pub fn apply(&self, money: Money) -> Money {
        money.multiply(self.0)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", (self.0 * dec!(100)).round_dp(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_rounds_to_two_places() {
        let m = Money::new(dec!(10.005));
        assert_eq!(m.amount(), dec!(10.00));
        let m = Money::new(dec!(10.016));
        assert_eq!(m.amount(), dec!(10.02));
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(dec!(100.00));
        let b = Money::new(dec!(40.50));

        assert_eq!((a + b).amount(), dec!(140.50));
        assert_eq!((a - b).amount(), dec!(59.50));
        assert_eq!((-b).amount(), dec!(-40.50));
    }

    #[test]
    fn test_split_equal_remainder_goes_last() {
        let shares = Money::new(dec!(100.00)).split_equal(3).unwrap();
        assert_eq!(
            shares,
            vec![
                Money::new(dec!(33.33)),
                Money::new(dec!(33.33)),
                Money::new(dec!(33.34)),
            ]
        );
        assert_eq!(shares.into_iter().sum::<Money>(), Money::new(dec!(100.00)));
    }

    #[test]
    fn test_split_equal_never_goes_negative() {
        // 0.12 / 8 rounds the even share up to 0.02; floor division keeps
        // every share at 0.01 and the remainder lands on the last one.
        let shares = Money::new(dec!(0.12)).split_equal(8).unwrap();
        assert_eq!(shares[..7], vec![Money::new(dec!(0.01)); 7]);
        assert_eq!(shares[7], Money::new(dec!(0.05)));
        assert!(shares.iter().all(|s| !s.is_negative()));
        assert_eq!(shares.into_iter().sum::<Money>(), Money::new(dec!(0.12)));
    }

    #[test]
    fn test_split_equal_exact_division() {
        let shares = Money::new(dec!(90.00)).split_equal(3).unwrap();
        assert!(shares.iter().all(|s| *s == Money::new(dec!(30.00))));
    }

    #[test]
    fn test_split_equal_rejects_zero_count() {
        assert_eq!(
            Money::new(dec!(10.00)).split_equal(0),
            Err(MoneyError::DivisionByZero)
        );
    }

    #[test]
    fn test_split_equal_rejects_negative() {
        assert!(matches!(
            Money::new(dec!(-1.00)).split_equal(2),
            Err(MoneyError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_approx_eq_tolerance() {
        let a = Money::new(dec!(50.00));
        assert!(a.approx_eq(Money::new(dec!(50.01))));
        assert!(a.approx_eq(Money::new(dec!(49.99))));
        assert!(!a.approx_eq(Money::new(dec!(50.02))));
    }

    #[test]
    fn test_rate_application() {
        let profit = Money::new(dec!(300.00));
        assert_eq!(Rate::half().apply(profit), Money::new(dec!(150.00)));
        assert_eq!(Rate::full().apply(profit), profit);
    }
}
