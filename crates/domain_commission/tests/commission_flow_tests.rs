//! Commission flows over complete bookings

use rust_decimal_macros::dec;

use core_kernel::{LedgerError, Money, Rate};
use domain_commission::{CommissionKind, CommissionLedger};
use test_utils::{assert_money_approx_eq, PaymentFixtures, TestBookingBuilder};

mod reconciliation_tests {
    use super::*;

    /// Builder defaults: selling 1000, cost 700, surcharge 20, 600 paid
    /// up front, one 400 instalment. Profit 280.
    #[test]
    fn test_initial_then_reconciliation_across_settlement() {
        let mut booking = TestBookingBuilder::new().with_default_schedule().build();
        let mut ledger = CommissionLedger::new();

        ledger
            .record_initial(&booking, booking.agent_id, Rate::half(), None)
            .unwrap();

        let instalment_id = booking.instalments[0].id;
        booking
            .record_instalment_payment(
                instalment_id,
                PaymentFixtures::bank_transfer(Money::new(dec!(400.00))),
            )
            .unwrap();
        assert!(booking.balance().is_zero());

        let id = ledger
            .record_final_reconciliation(&booking, booking.agent_id)
            .unwrap();
        // 280 final profit minus the 140 initial commission
        assert_money_approx_eq(ledger.get(id).unwrap().amount, Money::new(dec!(140.00)));

        let entries = ledger.entries_for_booking(booking.id);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, CommissionKind::Initial);
        assert_eq!(entries[1].kind, CommissionKind::FinalReconciliation);
    }

    #[test]
    fn test_reconciliation_rejected_while_instalment_outstanding() {
        let booking = TestBookingBuilder::new().with_default_schedule().build();
        let mut ledger = CommissionLedger::new();
        ledger
            .record_initial(&booking, booking.agent_id, Rate::half(), None)
            .unwrap();

        let err = ledger
            .record_final_reconciliation(&booking, booking.agent_id)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
    }
}
