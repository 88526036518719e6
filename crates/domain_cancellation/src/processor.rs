//! Cancellation processing
//!
//! `ACTIVE --cancel(fees)--> CANCELLED`, deriving exactly one outcome
//! from `shortfall = supplier_fee + admin_fee − received`:
//! positive → customer payable; negative → refund obligation, routed by
//! the caller-selected policy (cash or store credit); zero → settled.
//! The supplier's cancellation fee additionally opens a supplier
//! payable so it can be settled through the normal settlement flow.

use serde::{Deserialize, Serialize};

use core_kernel::{CancellationId, LedgerError, Money};
use domain_booking::{Booking, Payment};
use domain_credit::{CreditNote, CreditNoteRegistry};
use domain_settlement::{Payable, PayableParty};

use crate::cancellation::{Cancellation, CancellationOutcome, RefundStatus};

/// Caller-selected routing for a refund obligation; never inferred by
/// the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundPolicy {
    /// Cash owed to the passenger, paid out later
    CashRefund,
    /// Store credit issued immediately
    StoreCredit,
}

/// Everything a cancellation produced, to be persisted together
#[derive(Debug, Clone)]
pub struct CancellationResult {
    pub cancellation: Cancellation,
    /// Shortfall owed by the customer, when fees exceeded received
    pub customer_payable: Option<Payable>,
    /// The supplier's cancellation fee, owed to the supplier
    pub supplier_payable: Option<Payable>,
    /// Store credit issued under `RefundPolicy::StoreCredit`
    pub credit_note: Option<CreditNote>,
}

/// Cancels the booking and derives the single financial outcome
pub fn cancel(
    booking: &mut Booking,
    supplier_fee: Money,
    admin_fee: Money,
    policy: RefundPolicy,
) -> Result<CancellationResult, LedgerError> {
    if supplier_fee.is_negative() {
        return Err(LedgerError::validation_field(
            format!("supplier fee must not be negative, got {}", supplier_fee),
            "supplier_fee",
        ));
    }
    if admin_fee.is_negative() {
        return Err(LedgerError::validation_field(
            format!("admin fee must not be negative, got {}", admin_fee),
            "admin_fee",
        ));
    }
    if booking.is_cancelled() {
        return Err(LedgerError::invalid_state(format!(
            "booking {} is already cancelled",
            booking.folder_no
        )));
    }

    let received = booking.received();
    let shortfall = supplier_fee + admin_fee - received;
    let cancellation_id = CancellationId::new_v7();

    let mut customer_payable = None;
    let mut credit_note = None;

    let outcome = if shortfall.is_positive() {
        let payable = Payable::new(
            PayableParty::Customer,
            booking.id,
            format!(
                "Cancellation fees (supplier {} + admin {}) exceed received {}",
                supplier_fee, admin_fee, received
            ),
            shortfall,
        )?;
        let outcome = CancellationOutcome::CustomerPayable {
            payable_id: payable.id,
            amount: shortfall,
        };
        customer_payable = Some(payable);
        outcome
    } else if shortfall.is_negative() {
        let refund = shortfall.abs();
        match policy {
            RefundPolicy::CashRefund => CancellationOutcome::CashRefund {
                amount: refund,
                status: RefundStatus::Pending,
            },
            RefundPolicy::StoreCredit => {
                let note = CreditNote::issue(cancellation_id, booking.folder_no, refund)?;
                let outcome = CancellationOutcome::CreditNote {
                    note_id: note.id,
                    amount: note.initial_amount,
                };
                credit_note = Some(note);
                outcome
            }
        }
    } else {
        CancellationOutcome::Settled
    };

    let cancellation = Cancellation::new(
        cancellation_id,
        booking.id,
        booking.folder_no,
        supplier_fee,
        admin_fee,
        outcome,
    );

    let supplier_payable = if supplier_fee.is_positive() {
        Some(Payable::new(
            PayableParty::Supplier,
            booking.id,
            format!("Supplier cancellation fee for folder {}", booking.folder_no),
            supplier_fee,
        )?)
    } else {
        None
    };

    booking.mark_cancelled(cancellation.id)?;

    Ok(CancellationResult {
        cancellation,
        customer_payable,
        supplier_payable,
        credit_note,
    })
}

/// Converts an issued credit note into a cash refund.
///
/// The documented trade: paying cash voids whatever credit remains on
/// the note, including a partially-used remainder; the refund payment is
/// for exactly that remainder, and the note never pays out twice.
pub fn convert_credit_to_refund(
    cancellation: &mut Cancellation,
    registry: &mut CreditNoteRegistry,
    payment: Payment,
) -> Result<Money, LedgerError> {
    let note_id = match &cancellation.outcome {
        CancellationOutcome::CreditNote { note_id, .. } => *note_id,
        _ => {
            return Err(LedgerError::invalid_state(format!(
                "cancellation {} did not issue a credit note",
                cancellation.id
            )))
        }
    };

    let remaining = registry
        .get(note_id)
        .ok_or_else(|| LedgerError::not_found("CreditNote", note_id))?
        .remaining();
    if !remaining.is_positive() {
        return Err(LedgerError::invalid_state(format!(
            "credit note {} has no remaining credit to refund",
            note_id
        )));
    }
    if !payment.amount.approx_eq(remaining) {
        return Err(LedgerError::validation_field(
            format!(
                "refund payment {} does not match remaining credit {}",
                payment.amount, remaining
            ),
            "amount",
        ));
    }

    let forfeited = registry.void_remaining(note_id)?;
    cancellation.outcome = CancellationOutcome::CashRefund {
        amount: forfeited,
        status: RefundStatus::Paid { payment },
    };

    Ok(forfeited)
}
