//! Read-only booking snapshot
//!
//! A serializable projection of everything tied to one booking, built
//! for document and report generation. Derived figures are evaluated
//! once at build time against the `as_of` date, so the snapshot is
//! self-consistent even if the stores move on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::InstalmentId;
use domain_booking::{Booking, FinancialSummary, InstalmentStatus};
use domain_cancellation::Cancellation;
use domain_commission::CommissionEntry;
use domain_credit::{CreditNote, CreditNoteStatus};
use domain_settlement::Payable;

/// One instalment with its status as of the snapshot date
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InstalmentView {
    pub instalment_id: InstalmentId,
    pub due_date: NaiveDate,
    pub status: InstalmentStatus,
}

/// One credit note with its derived status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditNoteView {
    pub note: CreditNote,
    pub status: CreditNoteStatus,
}

/// The full financial picture of one booking at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSnapshot {
    pub booking: Booking,
    pub summary: FinancialSummary,
    pub instalments: Vec<InstalmentView>,
    pub cancellation: Option<Cancellation>,
    pub payables: Vec<Payable>,
    pub credit_notes: Vec<CreditNoteView>,
    pub commission_entries: Vec<CommissionEntry>,
    pub as_of: NaiveDate,
}

impl BookingSnapshot {
    pub(crate) fn build(
        booking: Booking,
        cancellation: Option<Cancellation>,
        payables: Vec<Payable>,
        credit_notes: Vec<CreditNote>,
        commission_entries: Vec<CommissionEntry>,
        as_of: NaiveDate,
    ) -> Self {
        let summary = FinancialSummary {
            profit: booking.profit(),
            received: booking.received(),
            balance: booking.balance(),
            last_payment_date: booking.last_payment_date(),
        };
        let instalments = booking
            .instalments
            .iter()
            .map(|i| InstalmentView {
                instalment_id: i.id,
                due_date: i.due_date,
                status: i.status_on(as_of),
            })
            .collect();
        let credit_notes = credit_notes
            .into_iter()
            .map(|note| CreditNoteView {
                status: note.status(),
                note,
            })
            .collect();

        Self {
            booking,
            summary,
            instalments,
            cancellation,
            payables,
            credit_notes,
            commission_entries,
            as_of,
        }
    }

    /// Payables still carrying a pending balance
    pub fn open_payables(&self) -> impl Iterator<Item = &Payable> {
        self.payables.iter().filter(|p| !p.fully_settled())
    }
}
