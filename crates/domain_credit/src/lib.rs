//! Credit Note Domain
//!
//! Store credit issued to customers, almost always from a cancellation.
//! A note's remaining amount and status are pure derivations of its
//! usage history (and void flag), so they cannot drift: there is no
//! stored remaining-amount field to forget to update.
//!
//! Allocation is all-or-nothing: every selection is validated against
//! the notes' remaining credit and the funded payment amount before any
//! note is touched.

pub mod note;
pub mod registry;

pub use note::{CreditNote, CreditNoteStatus, CreditNoteUsage};
pub use registry::{CreditNoteRegistry, CreditSelection};
