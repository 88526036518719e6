//! Core Kernel - Foundational types for the booking financial ledger
//!
//! This crate provides the building blocks used across all domain modules:
//! - Money with precise decimal arithmetic and the 2-decimal rounding policy
//! - Strongly-typed identifiers and human-facing folder numbers
//! - Commission month value type
//! - The shared error taxonomy and the versioned aggregate-store port

pub mod error;
pub mod folder;
pub mod identifiers;
pub mod money;
pub mod ports;
pub mod temporal;

pub use error::LedgerError;
pub use folder::FolderNo;
pub use identifiers::{
    AgentId, AmendmentId, BookingId, CancellationId, CommissionEntryId, CostItemId, CreditNoteId,
    InstalmentId, PayableId, PaymentId, SettlementId,
};
pub use money::{Money, MoneyError, Rate};
pub use ports::{AggregateStore, Version, Versioned};
pub use temporal::{CommissionMonth, TemporalError};
