//! End-to-end tests for the ledger engine

use std::sync::{Arc, Barrier, Once};
use std::thread;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::{AgentId, CommissionMonth, FolderNo, LedgerError, Money};
use domain_booking::{InstalmentStatus, TransactionMethod};
use domain_cancellation::{CancellationOutcome, RefundPolicy, RefundStatus};
use domain_commission::CommissionKind;
use domain_credit::CreditSelection;
use domain_settlement::PayableParty;
use interface_engine::{
    CreateFullBooking, CreateInternalBooking, LedgerEngine, NewCostItem, NewInstalment, NewPayment,
};
use test_utils::{assert_money_approx_eq, assert_money_zero};

static TRACING: Once = Once::new();

fn init() -> LedgerEngine {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("info")
            .with_test_writer()
            .try_init();
    });
    LedgerEngine::in_memory()
}

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, m, d).unwrap()
}

fn money(d: rust_decimal::Decimal) -> Money {
    Money::new(d)
}

fn bank_transfer(amount: rust_decimal::Decimal) -> NewPayment {
    NewPayment {
        amount: money(amount),
        method: TransactionMethod::BankTransfer,
        date: date(1, 10),
    }
}

/// FULL booking: revenue 1000, cost 700, surcharge 20, 600 received.
/// Profit 280, balance 400.
fn full_booking_request(folder: u32) -> CreateFullBooking {
    CreateFullBooking {
        folder_no: FolderNo::new(folder),
        agent_id: AgentId::new(),
        revenue: money(dec!(1000.00)),
        surcharge: money(dec!(20.00)),
        cost_items: vec![NewCostItem {
            description: "Package".to_string(),
            amount: money(dec!(700.00)),
        }],
        payments: vec![bank_transfer(dec!(600.00))],
        commission_month: None,
    }
}

/// INTERNAL booking: selling 1000, cost 700, 600 up front, one 400
/// instalment due Jun 1. Profit 300, balance 400.
fn internal_booking_request(folder: u32) -> CreateInternalBooking {
    CreateInternalBooking {
        folder_no: FolderNo::new(folder),
        agent_id: AgentId::new(),
        selling_price: money(dec!(1000.00)),
        surcharge: Money::zero(),
        cost_items: vec![NewCostItem {
            description: "Package".to_string(),
            amount: money(dec!(700.00)),
        }],
        payments: vec![bank_transfer(dec!(600.00))],
        instalments: vec![NewInstalment {
            due_date: date(6, 1),
            amount: money(dec!(400.00)),
        }],
        commission_month: None,
    }
}

// ============================================================================
// Booking lifecycle
// ============================================================================

mod booking_tests {
    use super::*;

    #[test]
    fn test_full_booking_records_full_rate_commission() {
        let engine = init();
        let booking_id = engine.create_full_booking(full_booking_request(100)).unwrap();

        let booking = engine.booking(booking_id).unwrap();
        assert_eq!(booking.profit(), money(dec!(280.00)));
        assert_eq!(booking.balance(), money(dec!(400.00)));

        let entries = engine.commission_entries_for_booking(booking_id);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, CommissionKind::Initial);
        assert_eq!(entries[0].amount, money(dec!(280.00)));
    }

    #[test]
    fn test_internal_booking_records_half_rate_commission() {
        let engine = init();
        let booking_id = engine
            .create_internal_booking(internal_booking_request(101))
            .unwrap();

        let entries = engine.commission_entries_for_booking(booking_id);
        assert_eq!(entries.len(), 1);
        // Half of the 300 profit
        assert_eq!(entries[0].amount, money(dec!(150.00)));
    }

    #[test]
    fn test_instalment_payment_drives_balance_to_zero() {
        let engine = init();
        let booking_id = engine
            .create_internal_booking(internal_booking_request(102))
            .unwrap();
        let instalment_id = engine.booking(booking_id).unwrap().instalments[0].id;

        engine
            .record_instalment_payment(booking_id, instalment_id, bank_transfer(dec!(400.00)))
            .unwrap();

        let booking = engine.booking(booking_id).unwrap();
        assert_money_zero(booking.balance());
        assert_eq!(booking.received(), money(dec!(1000.00)));

        // Paying the same instalment again is rejected
        let err = engine
            .record_instalment_payment(booking_id, instalment_id, bank_transfer(dec!(400.00)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyPaid { .. }));
    }

    #[test]
    fn test_snapshot_reports_overdue_as_of_date() {
        let engine = init();
        let booking_id = engine
            .create_internal_booking(internal_booking_request(103))
            .unwrap();

        let before = engine.snapshot(booking_id, date(5, 1)).unwrap();
        assert_eq!(before.instalments[0].status, InstalmentStatus::Pending);

        let after = engine.snapshot(booking_id, date(6, 2)).unwrap();
        assert_eq!(after.instalments[0].status, InstalmentStatus::Overdue);
        assert_eq!(after.summary.balance, money(dec!(400.00)));
        assert_eq!(after.summary.last_payment_date, Some(date(6, 1)));
    }

    #[test]
    fn test_snapshot_serializes_for_report_generation() {
        let engine = init();
        let booking_id = engine
            .create_internal_booking(internal_booking_request(104))
            .unwrap();

        let snapshot = engine.snapshot(booking_id, date(6, 2)).unwrap();
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["summary"]["balance"], "400.00");
        assert_eq!(json["instalments"][0]["status"], "Overdue");
        assert_eq!(json["as_of"], "2026-06-02");
    }

    #[test]
    fn test_missing_booking_is_not_found() {
        let engine = init();
        let err = engine
            .record_initial_payment(core_kernel::BookingId::new(), bank_transfer(dec!(1.00)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }
}

// ============================================================================
// Amendments
// ============================================================================

mod amendment_tests {
    use super::*;

    #[test]
    fn test_write_off_and_reverse_round_trip() {
        let engine = init();
        let booking_id = engine.create_full_booking(full_booking_request(110)).unwrap();

        let amendment_id = engine
            .write_off(booking_id, "supplier absorbed the shortfall")
            .unwrap();
        assert_money_zero(engine.booking(booking_id).unwrap().balance());

        engine.reverse_amendment(booking_id, amendment_id).unwrap();
        assert_eq!(
            engine.booking(booking_id).unwrap().balance(),
            money(dec!(400.00))
        );

        let err = engine
            .reverse_amendment(booking_id, amendment_id)
            .unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyReversed { .. }));
    }

    #[test]
    fn test_adjustment_shifts_balance() {
        let engine = init();
        let booking_id = engine.create_full_booking(full_booking_request(111)).unwrap();

        engine
            .adjust_balance(booking_id, money(dec!(-50.00)), "goodwill discount")
            .unwrap();
        assert_eq!(
            engine.booking(booking_id).unwrap().balance(),
            money(dec!(350.00))
        );
    }
}

// ============================================================================
// Cancellation and refunds
// ============================================================================

mod cancellation_tests {
    use super::*;

    #[test]
    fn test_fee_shortfall_opens_customer_payable() {
        let engine = init();
        let mut request = full_booking_request(120);
        request.payments = vec![bank_transfer(dec!(60.00))];
        let booking_id = engine.create_full_booking(request).unwrap();

        let summary = engine
            .cancel_booking(
                booking_id,
                money(dec!(80.00)),
                money(dec!(20.00)),
                RefundPolicy::CashRefund,
            )
            .unwrap();

        let payable_id = summary.customer_payable_id.expect("customer payable");
        let payable = engine.payable(payable_id).unwrap();
        assert_eq!(payable.party, PayableParty::Customer);
        assert_eq!(payable.pending(), money(dec!(40.00)));

        let supplier_id = summary.supplier_payable_id.expect("supplier payable");
        assert_eq!(
            engine.payable(supplier_id).unwrap().pending(),
            money(dec!(80.00))
        );
        assert!(summary.credit_note_id.is_none());
        assert!(engine.booking(booking_id).unwrap().is_cancelled());
    }

    #[test]
    fn test_cash_refund_is_paid_once() {
        let engine = init();
        let mut request = full_booking_request(121);
        request.payments = vec![bank_transfer(dec!(150.00))];
        let booking_id = engine.create_full_booking(request).unwrap();

        let summary = engine
            .cancel_booking(
                booking_id,
                money(dec!(100.00)),
                Money::zero(),
                RefundPolicy::CashRefund,
            )
            .unwrap();

        engine
            .record_refund_paid(
                summary.cancellation_id,
                NewPayment {
                    amount: money(dec!(50.00)),
                    method: TransactionMethod::BankTransfer,
                    date: date(2, 1),
                },
            )
            .unwrap();

        let err = engine
            .record_refund_paid(
                summary.cancellation_id,
                NewPayment {
                    amount: money(dec!(50.00)),
                    method: TransactionMethod::BankTransfer,
                    date: date(2, 2),
                },
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyPaid { .. }));
    }

    #[test]
    fn test_cancelled_booking_rejects_further_payments() {
        let engine = init();
        let booking_id = engine.create_full_booking(full_booking_request(122)).unwrap();
        engine
            .cancel_booking(
                booking_id,
                money(dec!(600.00)),
                Money::zero(),
                RefundPolicy::CashRefund,
            )
            .unwrap();

        let err = engine
            .record_initial_payment(booking_id, bank_transfer(dec!(10.00)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
    }
}

// ============================================================================
// Credit notes across date changes
// ============================================================================

mod credit_note_tests {
    use super::*;

    /// Cancels a booking that had received 600 against 100 of fees,
    /// issuing a 500.00 credit note.
    fn cancelled_with_credit(engine: &LedgerEngine, folder: u32) -> core_kernel::CreditNoteId {
        let booking_id = engine
            .create_full_booking(full_booking_request(folder))
            .unwrap();
        let summary = engine
            .cancel_booking(
                booking_id,
                money(dec!(100.00)),
                Money::zero(),
                RefundPolicy::StoreCredit,
            )
            .unwrap();
        summary.credit_note_id.expect("credit note issued")
    }

    #[test]
    fn test_credit_follows_folder_ancestry() {
        let engine = init();
        cancelled_with_credit(&engine, 130);

        let available = engine.list_available_credit(FolderNo::new(130).next_derivative());
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].initial_amount, money(dec!(500.00)));

        assert!(engine.list_available_credit(FolderNo::new(999)).is_empty());
    }

    #[test]
    fn test_date_change_gets_next_derivative_and_keeps_agent() {
        let engine = init();
        let original = engine.create_full_booking(full_booking_request(131)).unwrap();
        let agent = engine.booking(original).unwrap().agent_id;

        let first = engine
            .create_date_change(original, internal_booking_request(0))
            .unwrap();
        let first_booking = engine.booking(first).unwrap();
        assert_eq!(first_booking.folder_no.to_string(), "131.1");
        assert_eq!(first_booking.agent_id, agent);

        let second = engine
            .create_date_change(original, internal_booking_request(0))
            .unwrap();
        assert_eq!(engine.booking(second).unwrap().folder_no.to_string(), "131.2");
    }

    #[test]
    fn test_pay_instalment_from_credit_note() {
        let engine = init();
        let note_id = cancelled_with_credit(&engine, 132);

        let mut request = internal_booking_request(0);
        request.payments = vec![];
        request.instalments = vec![NewInstalment {
            due_date: date(7, 1),
            amount: money(dec!(500.00)),
        }];
        let original = engine
            .bookings_for_folder_root(132)
            .into_iter()
            .next()
            .expect("cancelled original");
        let follow_on = engine.create_date_change(original, request).unwrap();
        let instalment_id = engine.booking(follow_on).unwrap().instalments[0].id;

        engine
            .pay_with_credit_notes(
                follow_on,
                Some(instalment_id),
                money(dec!(500.00)),
                &[CreditSelection {
                    note_id,
                    amount_to_use: money(dec!(500.00)),
                }],
                date(3, 1),
            )
            .unwrap();

        let booking = engine.booking(follow_on).unwrap();
        assert_eq!(booking.received(), money(dec!(500.00)));
        assert_eq!(
            booking.instalments[0].paid_with.as_ref().unwrap().method,
            TransactionMethod::CustomerCreditNote
        );
        assert!(engine
            .list_available_credit(booking.folder_no)
            .is_empty());
    }

    #[test]
    fn test_allocation_mismatch_persists_nothing() {
        let engine = init();
        let note_id = cancelled_with_credit(&engine, 133);
        let booking_id = engine.create_full_booking(full_booking_request(134)).unwrap();

        // Folder 134 does not descend from 133, so the note is rejected
        let err = engine
            .pay_with_credit_notes(
                booking_id,
                None,
                money(dec!(100.00)),
                &[CreditSelection {
                    note_id,
                    amount_to_use: money(dec!(100.00)),
                }],
                date(3, 1),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation { .. }));

        // Same-ancestry booking, mismatched totals: two minor units out
        let original = engine
            .bookings_for_folder_root(133)
            .into_iter()
            .next()
            .unwrap();
        let mut follow_on_request = internal_booking_request(0);
        follow_on_request.payments = vec![];
        let follow_on = engine
            .create_date_change(original, follow_on_request)
            .unwrap();
        let err = engine
            .pay_with_credit_notes(
                follow_on,
                None,
                money(dec!(100.00)),
                &[CreditSelection {
                    note_id,
                    amount_to_use: money(dec!(100.02)),
                }],
                date(3, 1),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::AllocationMismatch { .. }));

        // The note still carries its full credit and the booking took
        // no payment
        let available = engine.list_available_credit(FolderNo::new(133));
        assert_eq!(available[0].remaining(), money(dec!(500.00)));
        assert_money_zero(engine.booking(follow_on).unwrap().received());
    }

    #[test]
    fn test_convert_partially_used_credit_to_cash_refund() {
        let engine = init();
        let note_id = cancelled_with_credit(&engine, 135);
        let original = engine
            .bookings_for_folder_root(135)
            .into_iter()
            .next()
            .unwrap();
        let cancellation_id = engine.booking(original).unwrap().cancellation_id.unwrap();

        // Spend 200 of the 500 note on a follow-on booking
        let follow_on = engine
            .create_date_change(original, internal_booking_request(0))
            .unwrap();
        engine
            .pay_with_credit_notes(
                follow_on,
                None,
                money(dec!(200.00)),
                &[CreditSelection {
                    note_id,
                    amount_to_use: money(dec!(200.00)),
                }],
                date(3, 1),
            )
            .unwrap();

        // Cash out the 300 remainder; the note is voided
        let refunded = engine
            .convert_credit_to_refund(
                cancellation_id,
                NewPayment {
                    amount: money(dec!(300.00)),
                    method: TransactionMethod::BankTransfer,
                    date: date(4, 1),
                },
            )
            .unwrap();
        assert_eq!(refunded, money(dec!(300.00)));
        assert!(engine.list_available_credit(FolderNo::new(135)).is_empty());

        let snapshot = engine.snapshot(original, date(4, 1)).unwrap();
        let outcome = &snapshot.cancellation.as_ref().unwrap().outcome;
        assert!(matches!(
            outcome,
            CancellationOutcome::CashRefund {
                status: RefundStatus::Paid { .. },
                ..
            }
        ));
    }
}

// ============================================================================
// Settlement
// ============================================================================

mod settlement_tests {
    use super::*;

    fn supplier_payable(engine: &LedgerEngine, folder: u32) -> core_kernel::PayableId {
        let booking_id = engine
            .create_full_booking(full_booking_request(folder))
            .unwrap();
        let summary = engine
            .cancel_booking(
                booking_id,
                money(dec!(120.00)),
                Money::zero(),
                RefundPolicy::CashRefund,
            )
            .unwrap();
        summary.supplier_payable_id.expect("supplier payable")
    }

    #[test]
    fn test_partial_then_full_settlement() {
        let engine = init();
        let payable_id = supplier_payable(&engine, 140);

        engine
            .settle_payable(
                payable_id,
                money(dec!(50.00)),
                TransactionMethod::BankTransfer,
                date(5, 1),
            )
            .unwrap();
        assert_eq!(engine.payable(payable_id).unwrap().pending(), money(dec!(70.00)));

        engine
            .settle_payable(
                payable_id,
                money(dec!(70.00)),
                TransactionMethod::Cash,
                date(5, 9),
            )
            .unwrap();
        assert!(engine.payable(payable_id).unwrap().fully_settled());
    }

    #[test]
    fn test_overshoot_beyond_tolerance_rejected() {
        let engine = init();
        let payable_id = supplier_payable(&engine, 141);

        let err = engine
            .settle_payable(
                payable_id,
                money(dec!(150.00)),
                TransactionMethod::Cash,
                date(5, 2),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::ExceedsPending { .. }));
        assert_eq!(
            engine.payable(payable_id).unwrap().pending(),
            money(dec!(120.00))
        );
    }

    #[test]
    fn test_concurrent_settlement_commits_exactly_once() {
        let engine = Arc::new(init());
        let payable_id = supplier_payable(&engine, 142);

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    engine.settle_payable(
                        payable_id,
                        money(dec!(120.00)),
                        TransactionMethod::BankTransfer,
                        date(5, 3),
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);

        // The loser either lost the version race or saw the settled
        // balance, depending on interleaving; it never double-settles
        let err = results.into_iter().find_map(Result::err).unwrap();
        assert!(matches!(
            err,
            LedgerError::Conflict { .. } | LedgerError::ExceedsPending { .. }
        ));

        let payable = engine.payable(payable_id).unwrap();
        assert_eq!(payable.settlements.len(), 1);
        assert_money_zero(payable.pending());
    }
}

// ============================================================================
// Commission
// ============================================================================

mod commission_tests {
    use super::*;

    #[test]
    fn test_final_reconciliation_after_full_settlement() {
        let engine = init();
        let booking_id = engine
            .create_internal_booking(internal_booking_request(150))
            .unwrap();
        let instalment_id = engine.booking(booking_id).unwrap().instalments[0].id;

        // Balance must reach zero first
        let err = engine.record_final_reconciliation(booking_id).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));

        engine
            .record_instalment_payment(booking_id, instalment_id, bank_transfer(dec!(400.00)))
            .unwrap();
        engine.record_final_reconciliation(booking_id).unwrap();

        let entries = engine.commission_entries_for_booking(booking_id);
        assert_eq!(entries.len(), 2);
        let reconciliation = entries
            .iter()
            .find(|e| e.kind == CommissionKind::FinalReconciliation)
            .unwrap();
        // 300 final profit minus the 150 initial commission
        assert_money_approx_eq(reconciliation.amount, money(dec!(150.00)));

        let err = engine.record_final_reconciliation(booking_id).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
    }

    #[test]
    fn test_commission_month_reassignment() {
        let engine = init();
        let mut request = internal_booking_request(151);
        request.commission_month = Some("2026-03".parse().unwrap());
        let booking_id = engine.create_internal_booking(request).unwrap();

        let entry_id = engine.commission_entries_for_booking(booking_id)[0].id;
        engine
            .update_commission_month(entry_id, "2026-04".parse().unwrap())
            .unwrap();

        let march: CommissionMonth = "2026-03".parse().unwrap();
        let april: CommissionMonth = "2026-04".parse().unwrap();
        assert!(engine.commission_entries_for_month(march).is_empty());
        assert_eq!(engine.commission_entries_for_month(april).len(), 1);
    }
}

// ============================================================================
// Commit atomicity under storage failures
// ============================================================================

mod store_failure_tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, Ordering};

    use core_kernel::{AggregateStore, CreditNoteId, Version, Versioned};
    use domain_booking::Booking;
    use domain_credit::CreditNote;
    use infra_store::MemoryStore;
    use uuid::Uuid;

    /// Store wrapper that fails one flagged write, the way a concurrent
    /// writer or an unavailable backend would, then behaves normally
    struct FlakyStore<T> {
        kind: &'static str,
        inner: MemoryStore<T>,
        fail_next_insert: AtomicBool,
        fail_next_update: AtomicBool,
        fail_next_batch: AtomicBool,
    }

    impl<T: Clone> FlakyStore<T> {
        fn new(kind: &'static str) -> Self {
            Self {
                kind,
                inner: MemoryStore::new(kind),
                fail_next_insert: AtomicBool::new(false),
                fail_next_update: AtomicBool::new(false),
                fail_next_batch: AtomicBool::new(false),
            }
        }

        fn conflict(&self) -> LedgerError {
            LedgerError::Conflict {
                aggregate: self.kind,
                expected_version: Version::initial(),
                found_version: Version::initial().next(),
            }
        }
    }

    impl<T: Clone + Send + Sync> AggregateStore<T> for FlakyStore<T> {
        fn kind(&self) -> &'static str {
            self.kind
        }

        fn get(&self, id: Uuid) -> Result<Versioned<T>, LedgerError> {
            self.inner.get(id)
        }

        fn insert(&self, id: Uuid, value: T) -> Result<Version, LedgerError> {
            if self.fail_next_insert.swap(false, Ordering::SeqCst) {
                return Err(LedgerError::invalid_state(format!(
                    "{} insert rejected",
                    self.kind
                )));
            }
            self.inner.insert(id, value)
        }

        fn update(&self, id: Uuid, expected: Version, value: T) -> Result<Version, LedgerError> {
            if self.fail_next_update.swap(false, Ordering::SeqCst) {
                return Err(self.conflict());
            }
            self.inner.update(id, expected, value)
        }

        fn update_many(&self, writes: Vec<(Uuid, Version, T)>) -> Result<(), LedgerError> {
            if self.fail_next_batch.swap(false, Ordering::SeqCst) {
                return Err(self.conflict());
            }
            self.inner.update_many(writes)
        }

        fn list(&self) -> Vec<(Uuid, Versioned<T>)> {
            self.inner.list()
        }
    }

    struct FlakyFixture {
        engine: LedgerEngine,
        bookings: Arc<FlakyStore<Booking>>,
        credit_notes: Arc<FlakyStore<CreditNote>>,
    }

    fn flaky_engine() -> FlakyFixture {
        let bookings = Arc::new(FlakyStore::new("Booking"));
        let credit_notes = Arc::new(FlakyStore::new("CreditNote"));
        let engine = LedgerEngine::new(
            bookings.clone(),
            Arc::new(MemoryStore::new("Cancellation")),
            credit_notes.clone(),
            Arc::new(MemoryStore::new("Payable")),
        );
        FlakyFixture {
            engine,
            bookings,
            credit_notes,
        }
    }

    /// Cancels a fresh 600-received booking against 100 of fees,
    /// issuing a 500.00 credit note.
    fn credit_note_for(engine: &LedgerEngine, folder: u32) -> CreditNoteId {
        let booking_id = engine
            .create_full_booking(full_booking_request(folder))
            .unwrap();
        let summary = engine
            .cancel_booking(
                booking_id,
                money(dec!(100.00)),
                Money::zero(),
                RefundPolicy::StoreCredit,
            )
            .unwrap();
        summary.credit_note_id.expect("credit note issued")
    }

    /// Follow-on booking with no payments yet, in the note's ancestry.
    fn unpaid_follow_on(engine: &LedgerEngine, folder_root: u32) -> core_kernel::BookingId {
        let original = engine
            .bookings_for_folder_root(folder_root)
            .into_iter()
            .next()
            .unwrap();
        let mut request = internal_booking_request(0);
        request.payments = vec![];
        engine.create_date_change(original, request).unwrap()
    }

    #[test]
    fn test_credit_survives_booking_commit_conflict() {
        let fx = flaky_engine();
        let note_id = credit_note_for(&fx.engine, 160);
        let follow_on = unpaid_follow_on(&fx.engine, 160);
        let selection = [CreditSelection {
            note_id,
            amount_to_use: money(dec!(400.00)),
        }];

        fx.bookings.fail_next_update.store(true, Ordering::SeqCst);
        let err = fx
            .engine
            .pay_with_credit_notes(follow_on, None, money(dec!(400.00)), &selection, date(3, 1))
            .unwrap_err();
        assert!(err.is_retryable());

        // Neither side applied: the note kept its credit and the booking
        // took no payment
        let available = fx.engine.list_available_credit(FolderNo::new(160));
        assert_eq!(available[0].remaining(), money(dec!(500.00)));
        assert_money_zero(fx.engine.booking(follow_on).unwrap().received());

        // A retry against fresh state spends the credit exactly once
        fx.engine
            .pay_with_credit_notes(follow_on, None, money(dec!(400.00)), &selection, date(3, 1))
            .unwrap();
        let available = fx.engine.list_available_credit(FolderNo::new(160));
        assert_eq!(available[0].remaining(), money(dec!(100.00)));
        assert_eq!(
            fx.engine.booking(follow_on).unwrap().received(),
            money(dec!(400.00))
        );
    }

    #[test]
    fn test_booking_restored_when_note_commit_fails() {
        let fx = flaky_engine();
        let note_id = credit_note_for(&fx.engine, 161);
        let follow_on = unpaid_follow_on(&fx.engine, 161);

        fx.credit_notes.fail_next_batch.store(true, Ordering::SeqCst);
        let err = fx
            .engine
            .pay_with_credit_notes(
                follow_on,
                None,
                money(dec!(400.00)),
                &[CreditSelection {
                    note_id,
                    amount_to_use: money(dec!(400.00)),
                }],
                date(3, 1),
            )
            .unwrap_err();
        assert!(err.is_retryable());

        // The booking rolled back along with the untouched note
        assert_money_zero(fx.engine.booking(follow_on).unwrap().received());
        let available = fx.engine.list_available_credit(FolderNo::new(161));
        assert_eq!(available[0].remaining(), money(dec!(500.00)));
    }

    #[test]
    fn test_conversion_rolls_back_when_note_commit_fails() {
        let fx = flaky_engine();
        credit_note_for(&fx.engine, 162);
        let original = fx
            .engine
            .bookings_for_folder_root(162)
            .into_iter()
            .next()
            .unwrap();
        let cancellation_id = fx.engine.booking(original).unwrap().cancellation_id.unwrap();
        let refund = NewPayment {
            amount: money(dec!(500.00)),
            method: TransactionMethod::BankTransfer,
            date: date(4, 1),
        };

        fx.credit_notes.fail_next_update.store(true, Ordering::SeqCst);
        let err = fx
            .engine
            .convert_credit_to_refund(cancellation_id, refund.clone())
            .unwrap_err();
        assert!(err.is_retryable());

        // The refund never paid out while the credit stayed spendable
        let available = fx.engine.list_available_credit(FolderNo::new(162));
        assert_eq!(available[0].remaining(), money(dec!(500.00)));

        // And the cancellation still accepts the conversion afterwards
        let refunded = fx
            .engine
            .convert_credit_to_refund(cancellation_id, refund)
            .unwrap();
        assert_eq!(refunded, money(dec!(500.00)));
        assert!(fx.engine.list_available_credit(FolderNo::new(162)).is_empty());
    }

    #[test]
    fn test_no_commission_entry_for_rejected_booking() {
        let fx = flaky_engine();
        let mut request = full_booking_request(163);
        request.commission_month = Some("2026-07".parse().unwrap());

        fx.bookings.fail_next_insert.store(true, Ordering::SeqCst);
        assert!(fx.engine.create_full_booking(request).is_err());

        let month: CommissionMonth = "2026-07".parse().unwrap();
        assert!(fx.engine.commission_entries_for_month(month).is_empty());
    }
}
