//! Cost breakdown items
//!
//! A booking's production cost is never entered as a single figure; it
//! is the sum of its cost items (flights, hotels, transfers, ...).

use serde::{Deserialize, Serialize};

use core_kernel::{CostItemId, LedgerError, Money};

/// One line of the booking's cost breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostItem {
    pub id: CostItemId,
    pub description: String,
    pub amount: Money,
}

impl CostItem {
    pub fn new(description: impl Into<String>, amount: Money) -> Result<Self, LedgerError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(LedgerError::validation_field(
                "cost item description must not be empty",
                "description",
            ));
        }
        if amount.is_negative() {
            return Err(LedgerError::validation_field(
                format!("cost item amount must not be negative, got {}", amount),
                "amount",
            ));
        }

        Ok(Self {
            id: CostItemId::new_v7(),
            description,
            amount,
        })
    }
}
