//! Commission ledger

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{
    AgentId, BookingId, CommissionEntryId, CommissionMonth, LedgerError, Money, Rate,
};
use domain_booking::{Booking, PaymentMethod};

use crate::entry::{CommissionEntry, CommissionKind};

/// Append-only record of commission entries across bookings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommissionLedger {
    entries: Vec<CommissionEntry>,
}

impl CommissionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CommissionEntry] {
        &self.entries
    }

    pub fn get(&self, id: CommissionEntryId) -> Option<&CommissionEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn entry_for_booking(
        &self,
        booking_id: BookingId,
        kind: CommissionKind,
    ) -> Option<&CommissionEntry> {
        self.entries
            .iter()
            .find(|e| e.booking_id == booking_id && e.kind == kind)
    }

    /// Records the INITIAL entry for a booking: `profit × rate`.
    ///
    /// The rate is policy-fixed at a half or the whole of profit; the
    /// month defaults to the current one and stays editable.
    pub fn record_initial(
        &mut self,
        booking: &Booking,
        agent_id: AgentId,
        rate: Rate,
        month: Option<CommissionMonth>,
    ) -> Result<CommissionEntryId, LedgerError> {
        let allowed = rate.as_decimal() == dec!(0.5) || rate.as_decimal() == dec!(1.0);
        if !allowed {
            return Err(LedgerError::validation_field(
                format!("commission rate must be 0.5 or 1.0, got {}", rate.as_decimal()),
                "rate",
            ));
        }
        if self
            .entry_for_booking(booking.id, CommissionKind::Initial)
            .is_some()
        {
            return Err(LedgerError::invalid_state(format!(
                "booking {} already has an initial commission entry",
                booking.folder_no
            )));
        }

        let entry = CommissionEntry::new(
            CommissionKind::Initial,
            rate.apply(booking.profit()),
            agent_id,
            booking.id,
            month.unwrap_or_else(CommissionMonth::current),
        );
        let id = entry.id;
        self.entries.push(entry);
        Ok(id)
    }

    /// Records the FINAL_RECONCILIATION entry: `final profit − initial
    /// commission`, signed.
    ///
    /// Valid at most once, only for INTERNAL bookings whose balance has
    /// reached zero and which already carry an initial entry.
    pub fn record_final_reconciliation(
        &mut self,
        booking: &Booking,
        agent_id: AgentId,
    ) -> Result<CommissionEntryId, LedgerError> {
        if booking.payment_method != PaymentMethod::Internal {
            return Err(LedgerError::invalid_state(format!(
                "booking {} is not an internal booking",
                booking.folder_no
            )));
        }
        if !booking.balance().is_zero() {
            return Err(LedgerError::invalid_state(format!(
                "booking {} still has an outstanding balance of {}",
                booking.folder_no,
                booking.balance()
            )));
        }
        if self
            .entry_for_booking(booking.id, CommissionKind::FinalReconciliation)
            .is_some()
        {
            return Err(LedgerError::invalid_state(format!(
                "booking {} has already been reconciled",
                booking.folder_no
            )));
        }
        let initial = self
            .entry_for_booking(booking.id, CommissionKind::Initial)
            .ok_or_else(|| {
                LedgerError::invalid_state(format!(
                    "booking {} has no initial commission entry to reconcile against",
                    booking.folder_no
                ))
            })?;

        let entry = CommissionEntry::new(
            CommissionKind::FinalReconciliation,
            booking.profit() - initial.amount,
            agent_id,
            booking.id,
            CommissionMonth::current(),
        );
        let id = entry.id;
        self.entries.push(entry);
        Ok(id)
    }

    /// Moves an entry to another accounting month; no monetary change
    pub fn update_commission_month(
        &mut self,
        entry_id: CommissionEntryId,
        month: CommissionMonth,
    ) -> Result<(), LedgerError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| LedgerError::not_found("CommissionEntry", entry_id))?;
        entry.month = month;
        Ok(())
    }

    /// All entries accounted under the given month
    pub fn entries_for_month(&self, month: CommissionMonth) -> Vec<&CommissionEntry> {
        self.entries.iter().filter(|e| e.month == month).collect()
    }

    /// All entries for one booking, in recording order
    pub fn entries_for_booking(&self, booking_id: BookingId) -> Vec<&CommissionEntry> {
        self.entries
            .iter()
            .filter(|e| e.booking_id == booking_id)
            .collect()
    }
}
