//! Request shapes accepted by the engine
//!
//! Thin data carriers translated into domain entities by the engine;
//! validation happens in the domain constructors, so a malformed
//! request fails before anything is persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{AgentId, CommissionMonth, FolderNo, Money};
use domain_booking::TransactionMethod;

/// A payment to record (initial, instalment, refund, or settlement)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub amount: Money,
    pub method: TransactionMethod,
    pub date: NaiveDate,
}

/// One line of the cost breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCostItem {
    pub description: String,
    pub amount: Money,
}

/// One entry of a user-defined instalment schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInstalment {
    pub due_date: NaiveDate,
    pub amount: Money,
}

/// Creates a FULL booking: revenue due up front
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFullBooking {
    pub folder_no: FolderNo,
    pub agent_id: AgentId,
    pub revenue: Money,
    pub surcharge: Money,
    pub cost_items: Vec<NewCostItem>,
    pub payments: Vec<NewPayment>,
    /// Accounting month for the initial commission; defaults to current
    pub commission_month: Option<CommissionMonth>,
}

/// Creates an INTERNAL booking with an instalment schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInternalBooking {
    pub folder_no: FolderNo,
    pub agent_id: AgentId,
    pub selling_price: Money,
    pub surcharge: Money,
    pub cost_items: Vec<NewCostItem>,
    pub payments: Vec<NewPayment>,
    pub instalments: Vec<NewInstalment>,
    pub commission_month: Option<CommissionMonth>,
}
