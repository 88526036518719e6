//! Cancellation Domain
//!
//! Cancelling a booking is terminal and derives exactly one financial
//! outcome from the fee/received comparison: the customer owes the
//! shortfall, or the customer is owed a refund (cash or store credit,
//! chosen by the caller), or the fees match what was received and the
//! cancellation closes clean. The outcome is a tagged variant, so
//! "exactly one or none" holds by construction rather than by
//! convention across optional fields.

pub mod cancellation;
pub mod processor;

pub use cancellation::{Cancellation, CancellationOutcome, RefundStatus};
pub use processor::{cancel, convert_credit_to_refund, CancellationResult, RefundPolicy};
