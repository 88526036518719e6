//! Credit note entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CancellationId, CreditNoteId, FolderNo, LedgerError, Money, PaymentId};

/// Derived note status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditNoteStatus {
    Available,
    PartiallyUsed,
    Used,
}

/// Links a note to the payment its credit funded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditNoteUsage {
    pub payment_id: PaymentId,
    pub amount_used: Money,
    pub used_at: DateTime<Utc>,
}

/// Store credit owned by exactly one cancellation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditNote {
    pub id: CreditNoteId,
    /// The cancellation this note was generated from
    pub cancellation_id: CancellationId,
    /// Folder of the original booking; availability follows this ancestry
    pub origin_folder: FolderNo,
    pub initial_amount: Money,
    pub usage_history: Vec<CreditNoteUsage>,
    /// Set when a cash refund superseded the note; the remainder is
    /// written off, not consumed, so no usage record is created
    pub voided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CreditNote {
    /// Issues a new note; the amount must be strictly positive
    pub fn issue(
        cancellation_id: CancellationId,
        origin_folder: FolderNo,
        amount: Money,
    ) -> Result<Self, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::validation_field(
                format!("credit note amount must be positive, got {}", amount),
                "amount",
            ));
        }

        Ok(Self {
            id: CreditNoteId::new_v7(),
            cancellation_id,
            origin_folder,
            initial_amount: amount,
            usage_history: Vec::new(),
            voided_at: None,
            created_at: Utc::now(),
        })
    }

    /// Total credit consumed so far
    pub fn used(&self) -> Money {
        self.usage_history.iter().map(|u| u.amount_used).sum()
    }

    /// Credit still spendable: `initial − Σ usages`, zero once voided
    pub fn remaining(&self) -> Money {
        if self.voided_at.is_some() {
            Money::zero()
        } else {
            self.initial_amount - self.used()
        }
    }

    /// Status derived from the remaining amount
    pub fn status(&self) -> CreditNoteStatus {
        let remaining = self.remaining();
        if remaining.is_zero() {
            CreditNoteStatus::Used
        } else if remaining < self.initial_amount {
            CreditNoteStatus::PartiallyUsed
        } else {
            CreditNoteStatus::Available
        }
    }

    pub fn is_voided(&self) -> bool {
        self.voided_at.is_some()
    }

    /// Consumes credit to fund a payment
    pub(crate) fn consume(
        &mut self,
        payment_id: PaymentId,
        amount: Money,
    ) -> Result<(), LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::validation_field(
                format!("amount to use must be positive, got {}", amount),
                "amount_to_use",
            ));
        }
        let remaining = self.remaining();
        if amount > remaining {
            return Err(LedgerError::InsufficientCredit {
                note_id: self.id,
                requested: amount,
                remaining,
            });
        }

        self.usage_history.push(CreditNoteUsage {
            payment_id,
            amount_used: amount,
            used_at: Utc::now(),
        });
        Ok(())
    }

    /// Writes off whatever remains, returning the forfeited amount
    pub(crate) fn void_remaining(&mut self) -> Result<Money, LedgerError> {
        let remaining = self.remaining();
        if !remaining.is_positive() {
            return Err(LedgerError::invalid_state(format!(
                "credit note {} has no remaining credit to void",
                self.id
            )));
        }
        self.voided_at = Some(Utc::now());
        Ok(remaining)
    }
}
