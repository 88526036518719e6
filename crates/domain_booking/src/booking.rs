//! The booking aggregate root

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AgentId, AmendmentId, BookingId, CancellationId, FolderNo, InstalmentId, LedgerError, Money};

use crate::amendment::{Amendment, AmendmentKind};
use crate::cost::CostItem;
use crate::instalment::Instalment;
use crate::payment::Payment;

/// Payment policy chosen at booking time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Paid in full up front
    Full,
    /// Paid through a user-defined instalment schedule
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Active,
    Cancelled,
}

/// A travel booking and its full monetary state
///
/// Child entities (payments, instalments, cost items, amendments) are
/// created only through operations on this aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub folder_no: FolderNo,
    pub agent_id: AgentId,
    pub revenue: Money,
    pub surcharge: Money,
    pub payment_method: PaymentMethod,
    pub status: BookingStatus,
    pub cost_items: Vec<CostItem>,
    /// Initial payments taken at booking time
    pub payments: Vec<Payment>,
    /// Instalment schedule; empty for FULL bookings
    pub instalments: Vec<Instalment>,
    pub amendments: Vec<Amendment>,
    /// Set once when the booking is cancelled; terminal
    pub cancellation_id: Option<CancellationId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a FULL booking: the whole revenue is due up front
    pub fn new_full(
        folder_no: FolderNo,
        agent_id: AgentId,
        revenue: Money,
        surcharge: Money,
        cost_items: Vec<CostItem>,
        payments: Vec<Payment>,
    ) -> Result<Self, LedgerError> {
        Self::new(
            folder_no,
            agent_id,
            revenue,
            surcharge,
            PaymentMethod::Full,
            cost_items,
            payments,
            Vec::new(),
        )
    }

    /// Creates an INTERNAL booking with a user-defined instalment schedule
    pub fn new_internal(
        folder_no: FolderNo,
        agent_id: AgentId,
        selling_price: Money,
        surcharge: Money,
        cost_items: Vec<CostItem>,
        payments: Vec<Payment>,
        instalments: Vec<Instalment>,
    ) -> Result<Self, LedgerError> {
        if instalments.is_empty() {
            return Err(LedgerError::validation_field(
                "an internal booking requires at least one instalment",
                "instalments",
            ));
        }
        Self::new(
            folder_no,
            agent_id,
            selling_price,
            surcharge,
            PaymentMethod::Internal,
            cost_items,
            payments,
            instalments,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn new(
        folder_no: FolderNo,
        agent_id: AgentId,
        revenue: Money,
        surcharge: Money,
        payment_method: PaymentMethod,
        cost_items: Vec<CostItem>,
        payments: Vec<Payment>,
        instalments: Vec<Instalment>,
    ) -> Result<Self, LedgerError> {
        if !revenue.is_positive() {
            return Err(LedgerError::validation_field(
                format!("revenue must be positive, got {}", revenue),
                "revenue",
            ));
        }
        if surcharge.is_negative() {
            return Err(LedgerError::validation_field(
                format!("surcharge must not be negative, got {}", surcharge),
                "surcharge",
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: BookingId::new_v7(),
            folder_no,
            agent_id,
            revenue,
            surcharge,
            payment_method,
            status: BookingStatus::Active,
            cost_items,
            payments,
            instalments,
            amendments: Vec::new(),
            cancellation_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    // ------------------------------------------------------------------
    // Derived projections
    // ------------------------------------------------------------------

    /// Production cost: the sum of the cost breakdown
    pub fn prod_cost(&self) -> Money {
        self.cost_items.iter().map(|c| c.amount).sum()
    }

    /// `profit = revenue − prod_cost − surcharge`
    pub fn profit(&self) -> Money {
        self.revenue - self.prod_cost() - self.surcharge
    }

    /// Sum of initial payments plus paid instalments
    pub fn received(&self) -> Money {
        let initial: Money = self.payments.iter().map(|p| p.amount).sum();
        let instalment_payments: Money = self
            .instalments
            .iter()
            .filter_map(|i| i.paid_with.as_ref())
            .map(|p| p.amount)
            .sum();
        initial + instalment_payments
    }

    /// Net delta from amendments that have not been reversed
    fn amendment_delta(&self) -> Money {
        self.amendments
            .iter()
            .filter(|a| !a.is_reversed)
            .map(|a| a.difference)
            .sum()
    }

    /// `balance = revenue − received`, shifted by live amendment deltas
    pub fn balance(&self) -> Money {
        self.revenue - self.received() + self.amendment_delta()
    }

    /// Latest scheduled due date (INTERNAL bookings)
    pub fn last_payment_date(&self) -> Option<NaiveDate> {
        self.instalments.iter().map(|i| i.due_date).max()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    pub fn find_instalment(&self, id: InstalmentId) -> Option<&Instalment> {
        self.instalments.iter().find(|i| i.id == id)
    }

    pub fn find_amendment(&self, id: AmendmentId) -> Option<&Amendment> {
        self.amendments.iter().find(|a| a.id == id)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Records an initial payment against the booking
    pub fn record_initial_payment(&mut self, payment: Payment) -> Result<(), LedgerError> {
        self.ensure_active()?;
        self.payments.push(payment);
        self.touch();
        Ok(())
    }

    /// Settles one instalment with the given payment
    pub fn record_instalment_payment(
        &mut self,
        instalment_id: InstalmentId,
        payment: Payment,
    ) -> Result<(), LedgerError> {
        self.ensure_active()?;
        let instalment = self
            .instalments
            .iter_mut()
            .find(|i| i.id == instalment_id)
            .ok_or_else(|| LedgerError::not_found("Instalment", instalment_id))?;
        instalment.record_payment(payment)?;
        self.touch();
        Ok(())
    }

    /// Writes the current balance off to zero, recording the exact delta
    pub fn write_off(&mut self, reason: impl Into<String>) -> Result<AmendmentId, LedgerError> {
        let difference = -self.balance();
        let amendment = Amendment::new(AmendmentKind::WriteOff, difference, reason)?;
        let id = amendment.id;
        self.amendments.push(amendment);
        self.touch();
        Ok(id)
    }

    /// Applies a signed manual correction to the balance
    pub fn adjust(
        &mut self,
        difference: Money,
        reason: impl Into<String>,
    ) -> Result<AmendmentId, LedgerError> {
        let amendment = Amendment::new(AmendmentKind::Adjustment, difference, reason)?;
        let id = amendment.id;
        self.amendments.push(amendment);
        self.touch();
        Ok(id)
    }

    /// Reverses an amendment, restoring the balance it moved; one-shot
    pub fn reverse_amendment(&mut self, amendment_id: AmendmentId) -> Result<(), LedgerError> {
        let amendment = self
            .amendments
            .iter_mut()
            .find(|a| a.id == amendment_id)
            .ok_or_else(|| LedgerError::not_found("Amendment", amendment_id))?;
        amendment.reverse()?;
        self.touch();
        Ok(())
    }

    /// Marks the booking cancelled; terminal, rejected on repeat
    pub fn mark_cancelled(&mut self, cancellation_id: CancellationId) -> Result<(), LedgerError> {
        self.ensure_active()?;
        self.status = BookingStatus::Cancelled;
        self.cancellation_id = Some(cancellation_id);
        self.touch();
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), LedgerError> {
        if self.is_cancelled() {
            return Err(LedgerError::invalid_state(format!(
                "booking {} is cancelled",
                self.folder_no
            )));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
