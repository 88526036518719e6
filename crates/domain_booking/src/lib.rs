//! Booking Domain - the root aggregate of the financial ledger
//!
//! A booking owns its initial payments, instalment schedule, cost
//! breakdown, and amendments. All child entities are created through
//! operations on the aggregate, never constructed free-standing by a
//! caller.
//!
//! # Core invariants
//!
//! - `profit = revenue − prod_cost − surcharge`
//! - `received = Σ initial payments + Σ paid instalments`
//! - `balance = revenue − received + Σ non-reversed amendment deltas`
//!
//! Profit, received, and balance are pure derivations, never stored, so
//! they cannot drift from the payment records that define them.

pub mod amendment;
pub mod booking;
pub mod cost;
pub mod instalment;
pub mod ledger;
pub mod payment;

pub use amendment::{Amendment, AmendmentKind};
pub use booking::{Booking, BookingStatus, PaymentMethod};
pub use cost::CostItem;
pub use instalment::{Instalment, InstalmentStatus};
pub use ledger::{compute_full, compute_internal, distribute_equally, FinancialSummary};
pub use payment::{Payment, TransactionMethod};
