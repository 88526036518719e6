//! Manual balance amendments
//!
//! An amendment is an immutable record of the exact delta applied to a
//! booking's balance outside the normal payment flow. Reversal applies
//! the inverse of that recorded delta, which is what makes it exact:
//! nothing is recomputed from scratch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AmendmentId, LedgerError, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmendmentKind {
    /// Drives the balance to exactly zero
    WriteOff,
    /// An arbitrary signed correction
    Adjustment,
}

/// A reason-logged balance correction, reversible exactly once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Amendment {
    pub id: AmendmentId,
    pub kind: AmendmentKind,
    /// Signed delta applied to the booking balance
    pub difference: Money,
    pub reason: String,
    pub is_reversed: bool,
    pub created_at: DateTime<Utc>,
    pub reversed_at: Option<DateTime<Utc>>,
}

impl Amendment {
    pub(crate) fn new(
        kind: AmendmentKind,
        difference: Money,
        reason: impl Into<String>,
    ) -> Result<Self, LedgerError> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(LedgerError::validation_field(
                "amendment reason must not be empty",
                "reason",
            ));
        }

        Ok(Self {
            id: AmendmentId::new_v7(),
            kind,
            difference,
            reason,
            is_reversed: false,
            created_at: Utc::now(),
            reversed_at: None,
        })
    }

    /// Marks the amendment reversed; one-shot, never re-reversible
    pub(crate) fn reverse(&mut self) -> Result<(), LedgerError> {
        if self.is_reversed {
            return Err(LedgerError::AlreadyReversed {
                amendment_id: self.id,
            });
        }
        self.is_reversed = true;
        self.reversed_at = Some(Utc::now());
        Ok(())
    }
}
