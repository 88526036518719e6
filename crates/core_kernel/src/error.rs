//! Shared error taxonomy for all engine operations
//!
//! Every variant carries the data the caller needs to present an
//! actionable message (remaining credit, pending balance, version pair)
//! rather than a generic failure. All errors are terminal for the
//! current operation; only `Conflict` is safe to retry automatically.

use thiserror::Error;

use crate::folder::FolderNoError;
use crate::identifiers::{AmendmentId, CreditNoteId};
use crate::money::{Money, MoneyError};
use crate::ports::Version;
use crate::temporal::TemporalError;

/// Engine error taxonomy
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Temporal error: {0}")]
    Temporal(#[from] TemporalError),

    #[error("Folder number error: {0}")]
    Folder(#[from] FolderNoError),

    /// Malformed or missing input; caller must correct and resubmit
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Re-application of a one-way payment transition
    #[error("{entity} has already been paid")]
    AlreadyPaid { entity: String },

    /// Second reversal of the same amendment
    #[error("Amendment {amendment_id} has already been reversed")]
    AlreadyReversed { amendment_id: AmendmentId },

    /// Settlement amount exceeds what remains on the payable
    #[error("Amount {requested} exceeds pending balance {pending}")]
    ExceedsPending { requested: Money, pending: Money },

    /// Credit-note selection exceeds the note's remaining amount
    #[error("Credit note {note_id}: requested {requested} exceeds remaining {remaining}")]
    InsufficientCredit {
        note_id: CreditNoteId,
        requested: Money,
        remaining: Money,
    },

    /// Credit-note selections do not sum to the funded payment amount
    #[error("Credit allocation {allocated_total} does not match funded amount {funded_amount}")]
    AllocationMismatch {
        funded_amount: Money,
        allocated_total: Money,
    },

    /// Lost an optimistic-concurrency race; re-fetch and retry
    #[error("Stale {aggregate} version: expected {expected_version}, found {found_version}")]
    Conflict {
        aggregate: &'static str,
        expected_version: Version,
        found_version: Version,
    },

    #[error("Not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// Operation not valid for the aggregate's current state
    #[error("Invalid state: {message}")]
    InvalidState { message: String },
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation {
            message: message.into(),
            field: None,
        }
    }

    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        LedgerError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn already_paid(entity: impl Into<String>) -> Self {
        LedgerError::AlreadyPaid {
            entity: entity.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        LedgerError::InvalidState {
            message: message.into(),
        }
    }

    /// True when a transport layer may transparently retry the operation
    /// against freshly-loaded state
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Conflict { .. })
    }
}
