//! Engine facade
//!
//! The single entry point external collaborators call. Every public
//! method is one logical mutation executed as an atomic
//! load-mutate-commit against the versioned stores; a lost concurrency
//! race surfaces as `LedgerError::Conflict` and persists nothing.
//! Failures use the shared taxonomy in `core_kernel::error`, never
//! transport-specific exceptions.

pub mod engine;
pub mod requests;
pub mod snapshot;

pub use engine::{CancellationSummary, LedgerEngine};
pub use requests::{
    CreateFullBooking, CreateInternalBooking, NewCostItem, NewInstalment, NewPayment,
};
pub use snapshot::BookingSnapshot;
