//! Payables and the settlement rules

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{BookingId, LedgerError, Money, PayableId};
use domain_booking::TransactionMethod;

use crate::settlement::Settlement;

/// Who the pending amount is owed to or by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayableParty {
    /// The business owes a supplier
    Supplier,
    /// A customer owes the business
    Customer,
}

/// An amount pending settlement
///
/// Invariant: `pending = total − Σ settlements`, never negative.
/// `pending` is derived, not stored. The engine does not deduplicate
/// identical settlement requests; callers must not double-submit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payable {
    pub id: PayableId,
    pub party: PayableParty,
    pub booking_id: BookingId,
    pub reason: String,
    pub total_amount: Money,
    pub settlements: Vec<Settlement>,
    pub created_at: DateTime<Utc>,
}

impl Payable {
    /// Opens a payable; the total must be strictly positive
    pub fn new(
        party: PayableParty,
        booking_id: BookingId,
        reason: impl Into<String>,
        total_amount: Money,
    ) -> Result<Self, LedgerError> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(LedgerError::validation_field(
                "payable reason must not be empty",
                "reason",
            ));
        }
        if !total_amount.is_positive() {
            return Err(LedgerError::validation_field(
                format!("payable total must be positive, got {}", total_amount),
                "total_amount",
            ));
        }

        Ok(Self {
            id: PayableId::new_v7(),
            party,
            booking_id,
            reason,
            total_amount,
            settlements: Vec::new(),
            created_at: Utc::now(),
        })
    }

    /// Amount still pending: `total − Σ settlements`, floored at zero
    ///
    /// The floor only matters when the final settlement used the one
    /// minor-unit rounding tolerance; the pending balance is never
    /// reported negative.
    pub fn pending(&self) -> Money {
        let pending = self.total_amount - self.settlements.iter().map(|s| s.amount).sum();
        if pending.is_negative() {
            Money::zero()
        } else {
            pending
        }
    }

    pub fn fully_settled(&self) -> bool {
        self.pending().is_zero()
    }

    /// Records a partial or full settlement.
    ///
    /// Rejected when the amount exceeds the pending balance by more than
    /// one minor unit (the tolerance absorbs caller-side rounding).
    pub fn settle(
        &mut self,
        amount: Money,
        method: TransactionMethod,
        date: NaiveDate,
    ) -> Result<&Settlement, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::validation_field(
                format!("settlement amount must be positive, got {}", amount),
                "amount",
            ));
        }
        let pending = self.pending();
        if amount > pending + Money::tolerance() {
            return Err(LedgerError::ExceedsPending {
                requested: amount,
                pending,
            });
        }

        self.settlements.push(Settlement::new(amount, method, date));
        Ok(self.settlements.last().expect("just pushed"))
    }
}
