//! Settlement records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Money, SettlementId};
use domain_booking::TransactionMethod;

/// An immutable payment reducing a payable's pending amount
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub id: SettlementId,
    pub amount: Money,
    pub method: TransactionMethod,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Settlement {
    pub(crate) fn new(amount: Money, method: TransactionMethod, date: NaiveDate) -> Self {
        Self {
            id: SettlementId::new_v7(),
            amount,
            method,
            date,
            created_at: Utc::now(),
        }
    }
}
