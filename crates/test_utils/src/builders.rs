//! Test Data Builders
//!
//! Builder patterns for constructing test bookings with sensible
//! defaults: tests specify only the fields they care about.

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::{AgentId, FolderNo, Money};
use domain_booking::{Booking, CostItem, Instalment, Payment};

use crate::fixtures::{IdFixtures, MoneyFixtures, PaymentFixtures, TemporalFixtures};

/// Builder for test bookings
///
/// Defaults to a FULL booking selling at 1000.00 with a 700.00 cost
/// line, a 20.00 surcharge, and a single 600.00 bank transfer, so
/// profit is 280.00 and balance 400.00. Adding instalments switches
/// the build to an INTERNAL booking.
pub struct TestBookingBuilder {
    folder_no: FolderNo,
    agent_id: AgentId,
    revenue: Money,
    surcharge: Money,
    cost_items: Vec<CostItem>,
    payments: Vec<Payment>,
    instalments: Vec<Instalment>,
}

impl Default for TestBookingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBookingBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            folder_no: IdFixtures::folder(),
            agent_id: IdFixtures::agent(),
            revenue: MoneyFixtures::selling_price(),
            surcharge: MoneyFixtures::surcharge(),
            cost_items: vec![
                CostItem::new("Package", MoneyFixtures::prod_cost()).expect("valid cost item"),
            ],
            payments: vec![PaymentFixtures::bank_transfer(Money::new(dec!(600.00)))],
            instalments: Vec::new(),
        }
    }

    /// Sets the folder number
    pub fn with_folder_no(mut self, folder_no: FolderNo) -> Self {
        self.folder_no = folder_no;
        self
    }

    /// Sets the booking agent
    pub fn with_agent_id(mut self, agent_id: AgentId) -> Self {
        self.agent_id = agent_id;
        self
    }

    /// Sets the revenue (selling price for INTERNAL bookings)
    pub fn with_revenue(mut self, revenue: Money) -> Self {
        self.revenue = revenue;
        self
    }

    /// Sets the surcharge
    pub fn with_surcharge(mut self, surcharge: Money) -> Self {
        self.surcharge = surcharge;
        self
    }

    /// Replaces the cost breakdown
    pub fn with_cost_items(mut self, cost_items: Vec<CostItem>) -> Self {
        self.cost_items = cost_items;
        self
    }

    /// Replaces the initial payments
    pub fn with_payments(mut self, payments: Vec<Payment>) -> Self {
        self.payments = payments;
        self
    }

    /// Removes all initial payments
    pub fn unpaid(mut self) -> Self {
        self.payments = Vec::new();
        self
    }

    /// Adds one instalment; the build becomes an INTERNAL booking
    pub fn with_instalment(mut self, due_date: NaiveDate, amount: Money) -> Self {
        self.instalments
            .push(Instalment::new(due_date, amount).expect("valid instalment"));
        self
    }

    /// Adds a single default instalment covering the outstanding 400.00
    pub fn with_default_schedule(self) -> Self {
        self.with_instalment(TemporalFixtures::due_date(), Money::new(dec!(400.00)))
    }

    /// Builds the booking
    pub fn build(self) -> Booking {
        if self.instalments.is_empty() {
            Booking::new_full(
                self.folder_no,
                self.agent_id,
                self.revenue,
                self.surcharge,
                self.cost_items,
                self.payments,
            )
            .expect("valid full booking")
        } else {
            Booking::new_internal(
                self.folder_no,
                self.agent_id,
                self.revenue,
                self.surcharge,
                self.cost_items,
                self.payments,
                self.instalments,
            )
            .expect("valid internal booking")
        }
    }
}
