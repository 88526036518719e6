//! Cancellation entity and outcome variants

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{BookingId, CancellationId, CreditNoteId, FolderNo, LedgerError, Money, PayableId};
use domain_booking::Payment;

/// Whether a cash refund obligation has been paid out yet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RefundStatus {
    Pending,
    Paid { payment: Payment },
}

/// Exactly one financial outcome per cancellation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CancellationOutcome {
    /// Fees matched what was received; nothing owed either way
    Settled,
    /// The customer owes the fee shortfall
    CustomerPayable { payable_id: PayableId, amount: Money },
    /// Cash owed back to the passenger
    CashRefund { amount: Money, status: RefundStatus },
    /// Store credit owed back to the customer
    CreditNote { note_id: CreditNoteId, amount: Money },
}

/// The cancellation of one booking; owned by that booking, terminal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cancellation {
    pub id: CancellationId,
    pub booking_id: BookingId,
    pub folder_no: FolderNo,
    pub supplier_fee: Money,
    pub admin_fee: Money,
    pub outcome: CancellationOutcome,
    pub created_at: DateTime<Utc>,
}

impl Cancellation {
    pub(crate) fn new(
        id: CancellationId,
        booking_id: BookingId,
        folder_no: FolderNo,
        supplier_fee: Money,
        admin_fee: Money,
        outcome: CancellationOutcome,
    ) -> Self {
        Self {
            id,
            booking_id,
            folder_no,
            supplier_fee,
            admin_fee,
            outcome,
            created_at: Utc::now(),
        }
    }

    /// The refund amount owed in cash, if any is still pending
    pub fn pending_refund(&self) -> Option<Money> {
        match &self.outcome {
            CancellationOutcome::CashRefund {
                amount,
                status: RefundStatus::Pending,
            } => Some(*amount),
            _ => None,
        }
    }

    /// Records the cash refund payout; valid only while the refund is
    /// pending
    pub fn record_refund_paid(&mut self, payment: Payment) -> Result<(), LedgerError> {
        match &mut self.outcome {
            CancellationOutcome::CashRefund { amount, status } => match status {
                RefundStatus::Pending => {
                    if !payment.amount.approx_eq(*amount) {
                        return Err(LedgerError::validation_field(
                            format!(
                                "refund payment {} does not match refund owed {}",
                                payment.amount, amount
                            ),
                            "amount",
                        ));
                    }
                    *status = RefundStatus::Paid { payment };
                    Ok(())
                }
                RefundStatus::Paid { .. } => Err(LedgerError::already_paid(format!(
                    "Refund for cancellation {}",
                    self.id
                ))),
            },
            _ => Err(LedgerError::invalid_state(format!(
                "cancellation {} has no cash refund to pay",
                self.id
            ))),
        }
    }
}
