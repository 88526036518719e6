//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for common entities across the booking
//! ledger. Fixtures are consistent and predictable so assertions can
//! use literal expected values.

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::{AgentId, CommissionMonth, FolderNo, Money};
use domain_booking::{Payment, TransactionMethod};

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// A standard round amount
    pub fn hundred() -> Money {
        Money::new(dec!(100.00))
    }

    /// A typical package selling price
    pub fn selling_price() -> Money {
        Money::new(dec!(1000.00))
    }

    /// A typical production cost against [`Self::selling_price`]
    pub fn prod_cost() -> Money {
        Money::new(dec!(700.00))
    }

    /// A typical card surcharge
    pub fn surcharge() -> Money {
        Money::new(dec!(20.00))
    }

    /// A supplier cancellation fee
    pub fn supplier_fee() -> Money {
        Money::new(dec!(80.00))
    }

    /// An administration fee charged on cancellation
    pub fn admin_fee() -> Money {
        Money::new(dec!(20.00))
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Standard booking date (Jan 10, 2026)
    pub fn booking_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 10).expect("valid date")
    }

    /// A due date after the booking date (Jun 1, 2026)
    pub fn due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).expect("valid date")
    }

    /// A day past [`Self::due_date`], for overdue checks
    pub fn after_due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 2).expect("valid date")
    }

    /// Standard commission accounting month
    pub fn commission_month() -> CommissionMonth {
        "2026-01".parse().expect("valid month")
    }
}

/// Fixture for identifier and folder test data
pub struct IdFixtures;

impl IdFixtures {
    pub fn agent() -> AgentId {
        AgentId::new()
    }

    /// A root folder number with no derivatives
    pub fn folder() -> FolderNo {
        FolderNo::new(1234)
    }

    /// The first date-change derivative of [`Self::folder`]
    pub fn derived_folder() -> FolderNo {
        Self::folder().next_derivative()
    }
}

/// Fixture for payment test data
pub struct PaymentFixtures;

impl PaymentFixtures {
    /// A bank transfer on the standard booking date
    pub fn bank_transfer(amount: Money) -> Payment {
        Payment::new(
            amount,
            TransactionMethod::BankTransfer,
            TemporalFixtures::booking_date(),
        )
        .expect("valid payment")
    }

    /// A cash payment on the standard booking date
    pub fn cash(amount: Money) -> Payment {
        Payment::new(
            amount,
            TransactionMethod::Cash,
            TemporalFixtures::booking_date(),
        )
        .expect("valid payment")
    }
}
