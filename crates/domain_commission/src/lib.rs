//! Commission Domain
//!
//! Each booking earns its agent an INITIAL commission entry at creation
//! time (a rate applied to the booking's profit) and, for INTERNAL
//! bookings only, at most one FINAL_RECONCILIATION entry once the
//! balance reaches zero. The reconciliation amount is signed: a top-up
//! when the final profit beat the initial commission, a clawback when
//! it fell short.

pub mod entry;
pub mod ledger;

pub use entry::{CommissionEntry, CommissionKind};
pub use ledger::CommissionLedger;
