//! Settlement Domain
//!
//! A payable is an amount owed either by the business to a supplier or
//! by a customer to the business. Settlements reduce its pending
//! balance until it reaches zero; a settlement that would drive the
//! pending balance negative is rejected outright.

pub mod payable;
pub mod settlement;

pub use payable::{Payable, PayableParty};
pub use settlement::Settlement;
