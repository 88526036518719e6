//! Commission entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AgentId, BookingId, CommissionEntryId, CommissionMonth, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommissionKind {
    /// Recorded once when the booking is created
    Initial,
    /// Recorded at most once, after full settlement of an INTERNAL booking
    FinalReconciliation,
}

/// One per-agent commission record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionEntry {
    pub id: CommissionEntryId,
    pub kind: CommissionKind,
    /// Signed: a FINAL_RECONCILIATION clawback is negative
    pub amount: Money,
    pub agent_id: AgentId,
    pub booking_id: BookingId,
    /// Accounting month; editable independently of the amount
    pub month: CommissionMonth,
    pub created_at: DateTime<Utc>,
}

impl CommissionEntry {
    pub(crate) fn new(
        kind: CommissionKind,
        amount: Money,
        agent_id: AgentId,
        booking_id: BookingId,
        month: CommissionMonth,
    ) -> Self {
        Self {
            id: CommissionEntryId::new_v7(),
            kind,
            amount,
            agent_id,
            booking_id,
            month,
            created_at: Utc::now(),
        }
    }
}
