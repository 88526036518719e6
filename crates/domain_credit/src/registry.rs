//! Credit note registry
//!
//! Holds the notes of one or more bookings and implements issuance,
//! ancestry-scoped availability, and all-or-nothing allocation against
//! a payment being funded.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use core_kernel::{CancellationId, CreditNoteId, FolderNo, LedgerError, Money, PaymentId};

use crate::note::{CreditNote, CreditNoteUsage};

/// One caller-selected slice of a note to put towards a payment
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreditSelection {
    pub note_id: CreditNoteId,
    pub amount_to_use: Money,
}

/// In-memory registry of credit notes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreditNoteRegistry {
    notes: Vec<CreditNote>,
}

impl CreditNoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry over an existing set of notes
    pub fn with_notes(notes: Vec<CreditNote>) -> Self {
        Self { notes }
    }

    pub fn into_notes(self) -> Vec<CreditNote> {
        self.notes
    }

    pub fn get(&self, id: CreditNoteId) -> Option<&CreditNote> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// Issues a note against a cancellation and returns its id
    pub fn issue(
        &mut self,
        cancellation_id: CancellationId,
        origin_folder: FolderNo,
        amount: Money,
    ) -> Result<CreditNoteId, LedgerError> {
        let note = CreditNote::issue(cancellation_id, origin_folder, amount)?;
        let id = note.id;
        self.notes.push(note);
        Ok(id)
    }

    /// Notes with spendable credit traceable to the given folder's
    /// original booking, offered during new-payment entry
    pub fn available_for(&self, folder: &FolderNo) -> Vec<&CreditNote> {
        self.notes
            .iter()
            .filter(|n| n.origin_folder.same_ancestry(folder) && n.remaining().is_positive())
            .collect()
    }

    /// Allocates the selections against the payment they fund.
    ///
    /// All-or-nothing: every selection is checked against its note's
    /// remaining credit, and the selections must sum to the funded
    /// amount within one minor unit, before any usage is recorded. On
    /// any failure nothing is allocated.
    pub fn allocate(
        &mut self,
        selections: &[CreditSelection],
        funded_amount: Money,
        payment_id: PaymentId,
    ) -> Result<Vec<CreditNoteUsage>, LedgerError> {
        if selections.is_empty() {
            return Err(LedgerError::validation_field(
                "at least one credit note selection is required",
                "selections",
            ));
        }

        // Validate before mutating anything. Selections may hit the same
        // note more than once, so check the per-note totals.
        let mut per_note: HashMap<CreditNoteId, Money> = HashMap::new();
        let mut allocated_total = Money::zero();
        for selection in selections {
            if !selection.amount_to_use.is_positive() {
                return Err(LedgerError::validation_field(
                    format!(
                        "amount to use must be positive, got {}",
                        selection.amount_to_use
                    ),
                    "amount_to_use",
                ));
            }
            let entry = per_note.entry(selection.note_id).or_insert_with(Money::zero);
            *entry += selection.amount_to_use;
            allocated_total += selection.amount_to_use;
        }

        for (note_id, requested) in &per_note {
            let note = self
                .get(*note_id)
                .ok_or_else(|| LedgerError::not_found("CreditNote", note_id))?;
            let remaining = note.remaining();
            if *requested > remaining {
                return Err(LedgerError::InsufficientCredit {
                    note_id: *note_id,
                    requested: *requested,
                    remaining,
                });
            }
        }

        if !allocated_total.approx_eq(funded_amount) {
            return Err(LedgerError::AllocationMismatch {
                funded_amount,
                allocated_total,
            });
        }

        let mut usages = Vec::with_capacity(selections.len());
        for selection in selections {
            let note = self
                .notes
                .iter_mut()
                .find(|n| n.id == selection.note_id)
                .ok_or_else(|| LedgerError::not_found("CreditNote", selection.note_id))?;
            note.consume(payment_id, selection.amount_to_use)?;
            usages.push(
                note.usage_history
                    .last()
                    .cloned()
                    .ok_or_else(|| LedgerError::invalid_state("usage record missing"))?,
            );
        }

        Ok(usages)
    }

    /// Voids a note's remainder, returning the forfeited amount
    pub fn void_remaining(&mut self, id: CreditNoteId) -> Result<Money, LedgerError> {
        let note = self
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| LedgerError::not_found("CreditNote", id))?;
        note.void_remaining()
    }
}
