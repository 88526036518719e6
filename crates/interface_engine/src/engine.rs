//! The ledger engine

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use core_kernel::{
    AggregateStore, AmendmentId, BookingId, CancellationId, CommissionEntryId, CommissionMonth,
    CreditNoteId, FolderNo, InstalmentId, LedgerError, Money, PayableId, PaymentId, Rate, Version,
};
use domain_booking::{
    Booking, CostItem, Instalment, Payment, PaymentMethod, TransactionMethod,
};
use domain_cancellation::{
    cancel, convert_credit_to_refund, Cancellation, CancellationOutcome, RefundPolicy,
};
use domain_commission::{CommissionEntry, CommissionLedger};
use domain_credit::{CreditNote, CreditNoteRegistry, CreditNoteStatus, CreditSelection};
use domain_settlement::Payable;
use infra_store::MemoryStore;

use crate::requests::{CreateFullBooking, CreateInternalBooking, NewPayment};
use crate::snapshot::BookingSnapshot;

/// What a cancellation produced, by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationSummary {
    pub cancellation_id: CancellationId,
    pub customer_payable_id: Option<PayableId>,
    pub supplier_payable_id: Option<PayableId>,
    pub credit_note_id: Option<CreditNoteId>,
}

/// The booking financial ledger and settlement engine
///
/// Owns one versioned store per aggregate root plus the commission
/// ledger. Invoked synchronously, one logical mutation per call; read
/// operations are pure and never lock out writers.
pub struct LedgerEngine {
    bookings: Arc<dyn AggregateStore<Booking>>,
    cancellations: Arc<dyn AggregateStore<Cancellation>>,
    credit_notes: Arc<dyn AggregateStore<CreditNote>>,
    payables: Arc<dyn AggregateStore<Payable>>,
    commissions: RwLock<CommissionLedger>,
    /// Serialises mutations so an operation spanning several stores never
    /// interleaves with another engine writer between its commits
    mutation: Mutex<()>,
}

impl LedgerEngine {
    /// Builds an engine over the given stores
    pub fn new(
        bookings: Arc<dyn AggregateStore<Booking>>,
        cancellations: Arc<dyn AggregateStore<Cancellation>>,
        credit_notes: Arc<dyn AggregateStore<CreditNote>>,
        payables: Arc<dyn AggregateStore<Payable>>,
    ) -> Self {
        Self {
            bookings,
            cancellations,
            credit_notes,
            payables,
            commissions: RwLock::new(CommissionLedger::new()),
            mutation: Mutex::new(()),
        }
    }

    /// Engine backed by in-memory stores
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new("Booking")),
            Arc::new(MemoryStore::new("Cancellation")),
            Arc::new(MemoryStore::new("CreditNote")),
            Arc::new(MemoryStore::new("Payable")),
        )
    }

    // ------------------------------------------------------------------
    // Booking creation
    // ------------------------------------------------------------------

    /// Creates a FULL booking and records its initial commission
    pub fn create_full_booking(&self, req: CreateFullBooking) -> Result<BookingId, LedgerError> {
        let booking = Booking::new_full(
            req.folder_no,
            req.agent_id,
            req.revenue,
            req.surcharge,
            build_cost_items(req.cost_items)?,
            build_payments(req.payments)?,
        )?;
        self.insert_booking(booking, req.commission_month)
    }

    /// Creates an INTERNAL booking with its instalment schedule and
    /// records its initial commission
    pub fn create_internal_booking(
        &self,
        req: CreateInternalBooking,
    ) -> Result<BookingId, LedgerError> {
        let instalments = req
            .instalments
            .into_iter()
            .map(|i| Instalment::new(i.due_date, i.amount))
            .collect::<Result<Vec<_>, _>>()?;
        let booking = Booking::new_internal(
            req.folder_no,
            req.agent_id,
            req.selling_price,
            req.surcharge,
            build_cost_items(req.cost_items)?,
            build_payments(req.payments)?,
            instalments,
        )?;
        self.insert_booking(booking, req.commission_month)
    }

    /// Creates a date-change follow-on: a new booking under the next
    /// derivative of the original folder, carrying the agent forward
    /// with new financial terms
    pub fn create_date_change(
        &self,
        original: BookingId,
        mut req: CreateInternalBooking,
    ) -> Result<BookingId, LedgerError> {
        let origin = self.bookings.get(original.into())?.value;
        req.folder_no = self.next_folder_in_ancestry(origin.folder_no);
        req.agent_id = origin.agent_id;
        self.create_internal_booking(req)
    }

    fn next_folder_in_ancestry(&self, folder: FolderNo) -> FolderNo {
        self.bookings
            .list()
            .into_iter()
            .map(|(_, v)| v.value.folder_no)
            .filter(|f| f.same_ancestry(&folder))
            .max()
            .unwrap_or(folder)
            .next_derivative()
    }

    fn insert_booking(
        &self,
        booking: Booking,
        commission_month: Option<CommissionMonth>,
    ) -> Result<BookingId, LedgerError> {
        let id = booking.id;
        let rate = match booking.payment_method {
            PaymentMethod::Full => Rate::full(),
            PaymentMethod::Internal => Rate::half(),
        };
        let folder = booking.folder_no;
        let profit = booking.profit();

        // The booking commits first: its commission entry must never
        // exist for a booking the store rejected.
        let _guard = self.mutation.lock().expect("mutation lock poisoned");
        self.bookings.insert(id.into(), booking.clone())?;
        let mut commissions = self.commissions.write().expect("commission lock poisoned");
        commissions.record_initial(&booking, booking.agent_id, rate, commission_month)?;

        info!(booking = %id, %folder, %profit, "booking created");
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Payments and instalments
    // ------------------------------------------------------------------

    /// Records an additional initial payment against a booking
    pub fn record_initial_payment(
        &self,
        booking_id: BookingId,
        payment: NewPayment,
    ) -> Result<PaymentId, LedgerError> {
        self.with_booking(booking_id, |booking| {
            let payment = Payment::new(payment.amount, payment.method, payment.date)?;
            let id = payment.id;
            booking.record_initial_payment(payment)?;
            Ok(id)
        })
    }

    /// Settles one instalment; rejected if it is already paid
    pub fn record_instalment_payment(
        &self,
        booking_id: BookingId,
        instalment_id: InstalmentId,
        payment: NewPayment,
    ) -> Result<PaymentId, LedgerError> {
        self.with_booking(booking_id, |booking| {
            let payment = Payment::new(payment.amount, payment.method, payment.date)?;
            let id = payment.id;
            booking.record_instalment_payment(instalment_id, payment)?;
            Ok(id)
        })
    }

    /// Funds a payment entirely from credit notes.
    ///
    /// All-or-nothing: the selections must cover the payment amount
    /// within one minor unit and stay within each note's remaining
    /// credit, and every selected note must trace back to the booking's
    /// original folder. Nothing persists on any failure.
    pub fn pay_with_credit_notes(
        &self,
        booking_id: BookingId,
        instalment_id: Option<InstalmentId>,
        amount: Money,
        selections: &[CreditSelection],
        date: NaiveDate,
    ) -> Result<PaymentId, LedgerError> {
        let _guard = self.mutation.lock().expect("mutation lock poisoned");
        let loaded = self.bookings.get(booking_id.into())?;
        let original = loaded.value.clone();
        let mut booking = loaded.value;

        // Load each selected note once, remembering its version
        let mut versions: HashMap<CreditNoteId, Version> = HashMap::new();
        let mut notes = Vec::new();
        for selection in selections {
            if versions.contains_key(&selection.note_id) {
                continue;
            }
            let note = self.credit_notes.get(selection.note_id.into())?;
            if !note.value.origin_folder.same_ancestry(&booking.folder_no) {
                return Err(LedgerError::validation_field(
                    format!(
                        "credit note {} belongs to folder {}, not the ancestry of {}",
                        selection.note_id, note.value.origin_folder, booking.folder_no
                    ),
                    "selections",
                ));
            }
            versions.insert(selection.note_id, note.version);
            notes.push(note.value);
        }

        let payment = Payment::new(amount, TransactionMethod::CustomerCreditNote, date)?;
        let payment_id = payment.id;

        let mut registry = CreditNoteRegistry::with_notes(notes);
        registry.allocate(selections, amount, payment_id)?;

        match instalment_id {
            Some(instalment_id) => booking.record_instalment_payment(instalment_id, payment)?,
            None => booking.record_initial_payment(payment)?,
        }

        // The booking commits first; if the note batch then fails, the
        // booking is restored so the payment and the credit it spent
        // never exist without each other.
        let committed = self
            .bookings
            .update(booking_id.into(), loaded.version, booking)?;
        let writes = registry
            .into_notes()
            .into_iter()
            .map(|note| {
                let version = versions[&note.id];
                (Uuid::from(note.id), version, note)
            })
            .collect();
        if let Err(err) = self.credit_notes.update_many(writes) {
            if let Err(restore) = self.bookings.update(booking_id.into(), committed, original) {
                error!(booking = %booking_id, %restore, "booking restore failed after credit commit failure");
            }
            return Err(err);
        }

        info!(booking = %booking_id, payment = %payment_id, %amount, "payment funded from credit notes");
        Ok(payment_id)
    }

    /// Credit notes with spendable balance traceable to this booking's
    /// original folder, for selection during payment entry
    pub fn list_available_credit(&self, folder: FolderNo) -> Vec<CreditNote> {
        let mut notes: Vec<CreditNote> = self
            .credit_notes
            .list()
            .into_iter()
            .map(|(_, v)| v.value)
            .filter(|n| n.origin_folder.same_ancestry(&folder) && n.remaining().is_positive())
            .collect();
        notes.sort_by_key(|n| n.created_at);
        notes
    }

    // ------------------------------------------------------------------
    // Cancellation
    // ------------------------------------------------------------------

    /// Cancels a booking, deriving exactly one outcome: a customer
    /// payable, a cash-refund obligation, a credit note, or a clean
    /// close. The supplier's fee opens a supplier payable alongside.
    pub fn cancel_booking(
        &self,
        booking_id: BookingId,
        supplier_fee: Money,
        admin_fee: Money,
        policy: RefundPolicy,
    ) -> Result<CancellationSummary, LedgerError> {
        let _guard = self.mutation.lock().expect("mutation lock poisoned");
        let loaded = self.bookings.get(booking_id.into())?;
        let mut booking = loaded.value;

        let result = cancel(&mut booking, supplier_fee, admin_fee, policy)?;
        self.bookings.update(booking_id.into(), loaded.version, booking)?;

        let summary = CancellationSummary {
            cancellation_id: result.cancellation.id,
            customer_payable_id: result.customer_payable.as_ref().map(|p| p.id),
            supplier_payable_id: result.supplier_payable.as_ref().map(|p| p.id),
            credit_note_id: result.credit_note.as_ref().map(|n| n.id),
        };

        self.cancellations
            .insert(result.cancellation.id.into(), result.cancellation)?;
        if let Some(payable) = result.customer_payable {
            self.payables.insert(payable.id.into(), payable)?;
        }
        if let Some(payable) = result.supplier_payable {
            self.payables.insert(payable.id.into(), payable)?;
        }
        if let Some(note) = result.credit_note {
            self.credit_notes.insert(note.id.into(), note)?;
        }

        info!(
            booking = %booking_id,
            cancellation = %summary.cancellation_id,
            %supplier_fee,
            %admin_fee,
            "booking cancelled"
        );
        Ok(summary)
    }

    /// Pays out a pending cash refund; one-way
    pub fn record_refund_paid(
        &self,
        cancellation_id: CancellationId,
        payment: NewPayment,
    ) -> Result<(), LedgerError> {
        let _guard = self.mutation.lock().expect("mutation lock poisoned");
        let loaded = self.cancellations.get(cancellation_id.into())?;
        let mut cancellation = loaded.value;

        let payment = Payment::new(payment.amount, payment.method, payment.date)?;
        cancellation.record_refund_paid(payment)?;
        self.cancellations
            .update(cancellation_id.into(), loaded.version, cancellation)?;

        info!(cancellation = %cancellation_id, "refund paid");
        Ok(())
    }

    /// Converts an issued credit note into a cash refund of its
    /// remainder, voiding the note
    pub fn convert_credit_to_refund(
        &self,
        cancellation_id: CancellationId,
        payment: NewPayment,
    ) -> Result<Money, LedgerError> {
        let _guard = self.mutation.lock().expect("mutation lock poisoned");
        let loaded_cancellation = self.cancellations.get(cancellation_id.into())?;
        let original = loaded_cancellation.value.clone();
        let mut cancellation = loaded_cancellation.value;

        let note_id = match &cancellation.outcome {
            CancellationOutcome::CreditNote { note_id, .. } => *note_id,
            _ => {
                return Err(LedgerError::invalid_state(format!(
                    "cancellation {} did not issue a credit note",
                    cancellation_id
                )))
            }
        };
        let loaded_note = self.credit_notes.get(note_id.into())?;
        if loaded_note.value.status() == CreditNoteStatus::PartiallyUsed {
            // Business policy under review: the partially-used remainder
            // is forfeited when cash is paid out.
            warn!(note = %note_id, "cash refund voids a partially used credit note");
        }

        let mut registry = CreditNoteRegistry::with_notes(vec![loaded_note.value]);
        let payment = Payment::new(payment.amount, payment.method, payment.date)?;
        let refunded = convert_credit_to_refund(&mut cancellation, &mut registry, payment)?;

        let note = registry
            .into_notes()
            .pop()
            .ok_or_else(|| LedgerError::invalid_state("credit note vanished during conversion"))?;
        // Cancellation first, then the note; a failed note commit rolls
        // the cancellation back so the refund never pays out while the
        // credit stays spendable.
        let committed = self.cancellations.update(
            cancellation_id.into(),
            loaded_cancellation.version,
            cancellation,
        )?;
        if let Err(err) = self
            .credit_notes
            .update(note_id.into(), loaded_note.version, note)
        {
            if let Err(restore) =
                self.cancellations
                    .update(cancellation_id.into(), committed, original)
            {
                error!(cancellation = %cancellation_id, %restore, "cancellation restore failed after note commit failure");
            }
            return Err(err);
        }

        info!(cancellation = %cancellation_id, note = %note_id, %refunded, "credit converted to cash refund");
        Ok(refunded)
    }

    // ------------------------------------------------------------------
    // Settlement
    // ------------------------------------------------------------------

    /// Records a partial or full settlement against a payable
    pub fn settle_payable(
        &self,
        payable_id: PayableId,
        amount: Money,
        method: TransactionMethod,
        date: NaiveDate,
    ) -> Result<(), LedgerError> {
        let _guard = self.mutation.lock().expect("mutation lock poisoned");
        let loaded = self.payables.get(payable_id.into())?;
        let mut payable = loaded.value;

        payable.settle(amount, method, date)?;
        let pending = payable.pending();
        self.payables
            .update(payable_id.into(), loaded.version, payable)?;

        info!(payable = %payable_id, %amount, %pending, "settlement recorded");
        Ok(())
    }

    pub fn payable(&self, payable_id: PayableId) -> Result<Payable, LedgerError> {
        Ok(self.payables.get(payable_id.into())?.value)
    }

    // ------------------------------------------------------------------
    // Commission
    // ------------------------------------------------------------------

    /// Records the final reconciliation for a fully-settled INTERNAL
    /// booking; signed top-up or clawback, at most once
    pub fn record_final_reconciliation(
        &self,
        booking_id: BookingId,
    ) -> Result<CommissionEntryId, LedgerError> {
        let booking = self.bookings.get(booking_id.into())?.value;
        let mut commissions = self.commissions.write().expect("commission lock poisoned");
        let id = commissions.record_final_reconciliation(&booking, booking.agent_id)?;
        info!(booking = %booking_id, entry = %id, "final commission reconciliation recorded");
        Ok(id)
    }

    /// Moves a commission entry to another accounting month
    pub fn update_commission_month(
        &self,
        entry_id: CommissionEntryId,
        month: CommissionMonth,
    ) -> Result<(), LedgerError> {
        let mut commissions = self.commissions.write().expect("commission lock poisoned");
        commissions.update_commission_month(entry_id, month)
    }

    pub fn commission_entries_for_booking(&self, booking_id: BookingId) -> Vec<CommissionEntry> {
        let commissions = self.commissions.read().expect("commission lock poisoned");
        commissions
            .entries_for_booking(booking_id)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn commission_entries_for_month(&self, month: CommissionMonth) -> Vec<CommissionEntry> {
        let commissions = self.commissions.read().expect("commission lock poisoned");
        commissions
            .entries_for_month(month)
            .into_iter()
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------
    // Amendments
    // ------------------------------------------------------------------

    /// Writes a booking's balance off to zero with a logged reason
    pub fn write_off(
        &self,
        booking_id: BookingId,
        reason: impl Into<String>,
    ) -> Result<AmendmentId, LedgerError> {
        let reason = reason.into();
        self.with_booking(booking_id, move |booking| {
            let id = booking.write_off(reason)?;
            info!(booking = %booking.id, amendment = %id, "balance written off");
            Ok(id)
        })
    }

    /// Applies a signed manual correction to a booking's balance
    pub fn adjust_balance(
        &self,
        booking_id: BookingId,
        difference: Money,
        reason: impl Into<String>,
    ) -> Result<AmendmentId, LedgerError> {
        let reason = reason.into();
        self.with_booking(booking_id, move |booking| {
            let id = booking.adjust(difference, reason)?;
            info!(booking = %booking.id, amendment = %id, %difference, "balance adjusted");
            Ok(id)
        })
    }

    /// Reverses an amendment exactly once, restoring the balance it moved
    pub fn reverse_amendment(
        &self,
        booking_id: BookingId,
        amendment_id: AmendmentId,
    ) -> Result<(), LedgerError> {
        self.with_booking(booking_id, move |booking| {
            booking.reverse_amendment(amendment_id)?;
            info!(booking = %booking.id, amendment = %amendment_id, "amendment reversed");
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn booking(&self, booking_id: BookingId) -> Result<Booking, LedgerError> {
        Ok(self.bookings.get(booking_id.into())?.value)
    }

    /// Ids of every booking whose folder shares the given root,
    /// original first, then date-change derivatives in order
    pub fn bookings_for_folder_root(&self, root: u32) -> Vec<BookingId> {
        let mut bookings: Vec<(FolderNo, BookingId)> = self
            .bookings
            .list()
            .into_iter()
            .map(|(_, v)| (v.value.folder_no, v.value.id))
            .filter(|(folder, _)| folder.root() == root)
            .collect();
        bookings.sort_by_key(|(folder, _)| *folder);
        bookings.into_iter().map(|(_, id)| id).collect()
    }

    /// Read-only snapshot for report/document generation; never mutates
    pub fn snapshot(
        &self,
        booking_id: BookingId,
        today: NaiveDate,
    ) -> Result<BookingSnapshot, LedgerError> {
        let booking = self.bookings.get(booking_id.into())?.value;

        let cancellation = match booking.cancellation_id {
            Some(id) => Some(self.cancellations.get(id.into())?.value),
            None => None,
        };
        let payables: Vec<Payable> = self
            .payables
            .list()
            .into_iter()
            .map(|(_, v)| v.value)
            .filter(|p| p.booking_id == booking.id)
            .collect();
        let credit_notes: Vec<CreditNote> = self
            .credit_notes
            .list()
            .into_iter()
            .map(|(_, v)| v.value)
            .filter(|n| n.origin_folder.same_ancestry(&booking.folder_no))
            .collect();
        let commission_entries = self.commission_entries_for_booking(booking_id);

        Ok(BookingSnapshot::build(
            booking,
            cancellation,
            payables,
            credit_notes,
            commission_entries,
            today,
        ))
    }

    // ------------------------------------------------------------------

    /// One atomic load-mutate-commit against a booking
    fn with_booking<R>(
        &self,
        booking_id: BookingId,
        mutate: impl FnOnce(&mut Booking) -> Result<R, LedgerError>,
    ) -> Result<R, LedgerError> {
        let _guard = self.mutation.lock().expect("mutation lock poisoned");
        let loaded = self.bookings.get(booking_id.into())?;
        let mut booking = loaded.value;
        let result = mutate(&mut booking)?;
        self.bookings
            .update(booking_id.into(), loaded.version, booking)?;
        Ok(result)
    }
}

fn build_payments(payments: Vec<NewPayment>) -> Result<Vec<Payment>, LedgerError> {
    payments
        .into_iter()
        .map(|p| Payment::new(p.amount, p.method, p.date))
        .collect()
}

fn build_cost_items(
    items: Vec<crate::requests::NewCostItem>,
) -> Result<Vec<CostItem>, LedgerError> {
    items
        .into_iter()
        .map(|c| CostItem::new(c.description, c.amount))
        .collect()
}
