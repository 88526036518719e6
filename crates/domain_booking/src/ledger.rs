//! Pure ledger projections
//!
//! These functions are side-effect-free and exist for two callers: the
//! booking aggregate itself, and presentation layers that preview
//! profit/balance before anything is submitted. The aggregate remains
//! the system of record; a preview is never persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{LedgerError, Money};

use crate::instalment::Instalment;

/// The derived financial shape of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub profit: Money,
    pub received: Money,
    pub balance: Money,
    /// Latest scheduled due date; `None` for FULL bookings
    pub last_payment_date: Option<NaiveDate>,
}

/// Projection for a FULL booking: the whole revenue is due up front
pub fn compute_full(
    revenue: Money,
    prod_cost: Money,
    surcharge: Money,
    payment_amounts: &[Money],
) -> Result<FinancialSummary, LedgerError> {
    if !revenue.is_positive() {
        return Err(LedgerError::validation_field(
            format!("revenue must be positive, got {}", revenue),
            "revenue",
        ));
    }
    validate_payments(payment_amounts)?;

    let received: Money = payment_amounts.iter().copied().sum();
    Ok(FinancialSummary {
        profit: revenue - prod_cost - surcharge,
        received,
        balance: revenue - received,
        last_payment_date: None,
    })
}

/// Projection for an INTERNAL booking: only paid instalments count as
/// received, and the last scheduled due date is surfaced
pub fn compute_internal(
    selling_price: Money,
    prod_cost: Money,
    surcharge: Money,
    payment_amounts: &[Money],
    instalments: &[Instalment],
) -> Result<FinancialSummary, LedgerError> {
    if !selling_price.is_positive() {
        return Err(LedgerError::validation_field(
            format!("selling price must be positive, got {}", selling_price),
            "selling_price",
        ));
    }
    validate_payments(payment_amounts)?;

    let initial: Money = payment_amounts.iter().copied().sum();
    let paid_instalments: Money = instalments
        .iter()
        .filter_map(|i| i.paid_with.as_ref())
        .map(|p| p.amount)
        .sum();
    let received = initial + paid_instalments;

    Ok(FinancialSummary {
        profit: selling_price - prod_cost - surcharge,
        received,
        balance: selling_price - received,
        last_payment_date: instalments.iter().map(|i| i.due_date).max(),
    })
}

/// Splits a balance into `count` equal instalment shares.
///
/// Shares come from floor division in minor units; the remainder is
/// assigned to the last share so the schedule sums exactly to the
/// balance and no share goes negative.
pub fn distribute_equally(balance: Money, count: u32) -> Result<Vec<Money>, LedgerError> {
    if count == 0 {
        return Err(LedgerError::validation_field(
            "instalment count must be at least 1",
            "count",
        ));
    }
    balance
        .split_equal(count)
        .map_err(|e| LedgerError::validation_field(e.to_string(), "balance"))
}

fn validate_payments(payment_amounts: &[Money]) -> Result<(), LedgerError> {
    for amount in payment_amounts {
        if !amount.is_positive() {
            return Err(LedgerError::validation_field(
                format!("payment amount must be positive, got {}", amount),
                "payments",
            ));
        }
    }
    Ok(())
}
