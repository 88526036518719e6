//! Instalment schedule entries
//!
//! Instalments are defined by the user at booking time for INTERNAL
//! bookings; the engine never auto-generates a schedule. `Overdue` is a
//! read-time derivation from the due date, not a stored transition; the
//! only stored transition is attaching a payment, which is one-way.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{InstalmentId, LedgerError, Money};

use crate::payment::Payment;

/// Derived instalment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstalmentStatus {
    Pending,
    Overdue,
    Paid,
}

/// A scheduled partial payment with a due date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instalment {
    pub id: InstalmentId,
    pub due_date: NaiveDate,
    pub amount: Money,
    /// The payment that settled this instalment, once recorded
    pub paid_with: Option<Payment>,
}

impl Instalment {
    /// Creates a schedule entry; the amount must be strictly positive
    pub fn new(due_date: NaiveDate, amount: Money) -> Result<Self, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::validation_field(
                format!("instalment amount must be positive, got {}", amount),
                "amount",
            ));
        }

        Ok(Self {
            id: InstalmentId::new_v7(),
            due_date,
            amount,
            paid_with: None,
        })
    }

    pub fn is_paid(&self) -> bool {
        self.paid_with.is_some()
    }

    /// Status as of the given day
    pub fn status_on(&self, today: NaiveDate) -> InstalmentStatus {
        if self.is_paid() {
            InstalmentStatus::Paid
        } else if self.due_date < today {
            InstalmentStatus::Overdue
        } else {
            InstalmentStatus::Pending
        }
    }

    /// Attaches the settling payment; one-way, rejected on repeat
    pub fn record_payment(&mut self, payment: Payment) -> Result<(), LedgerError> {
        if self.is_paid() {
            return Err(LedgerError::already_paid(format!("Instalment {}", self.id)));
        }
        self.paid_with = Some(payment);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::TransactionMethod;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instalment() -> Instalment {
        Instalment::new(date(2026, 6, 15), Money::new(dec!(200.00))).unwrap()
    }

    #[test]
    fn test_status_is_derived_from_due_date() {
        let inst = instalment();
        assert_eq!(inst.status_on(date(2026, 6, 1)), InstalmentStatus::Pending);
        assert_eq!(inst.status_on(date(2026, 6, 15)), InstalmentStatus::Pending);
        assert_eq!(inst.status_on(date(2026, 6, 16)), InstalmentStatus::Overdue);
    }

    #[test]
    fn test_paid_wins_over_overdue() {
        let mut inst = instalment();
        let payment = Payment::new(
            Money::new(dec!(200.00)),
            TransactionMethod::BankTransfer,
            date(2026, 7, 1),
        )
        .unwrap();
        inst.record_payment(payment).unwrap();

        assert_eq!(inst.status_on(date(2026, 7, 2)), InstalmentStatus::Paid);
    }

    #[test]
    fn test_record_payment_is_one_way() {
        let mut inst = instalment();
        let pay = |amount| {
            Payment::new(
                Money::new(amount),
                TransactionMethod::Cash,
                date(2026, 6, 10),
            )
            .unwrap()
        };

        inst.record_payment(pay(dec!(200.00))).unwrap();
        let err = inst.record_payment(pay(dec!(200.00))).unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyPaid { .. }));
    }
}
