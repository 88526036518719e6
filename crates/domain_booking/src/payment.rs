//! Payment records
//!
//! A payment is immutable once created: it is never edited or deleted,
//! only referenced by later amendments or reversals.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{LedgerError, Money, PaymentId};

/// How a payment was transacted
///
/// `CustomerCreditNote` is the sentinel for payments funded by
/// allocating store credit rather than fresh money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionMethod {
    Cash,
    BankTransfer,
    CreditCard,
    DebitCard,
    Cheque,
    CustomerCreditNote,
}

/// An initial payment, instalment payment, or refund payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub amount: Money,
    pub method: TransactionMethod,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a payment record; the amount must be strictly positive
    pub fn new(
        amount: Money,
        method: TransactionMethod,
        date: NaiveDate,
    ) -> Result<Self, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::validation_field(
                format!("payment amount must be positive, got {}", amount),
                "amount",
            ));
        }

        Ok(Self {
            id: PaymentId::new_v7(),
            amount,
            method,
            date,
            created_at: Utc::now(),
        })
    }
}
