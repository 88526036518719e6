//! Storage infrastructure
//!
//! The engine only needs read-modify-write with per-aggregate
//! versioning; this crate provides the in-memory implementation used by
//! the engine facade and by the test suites. Swapping in a database-
//! backed store is a matter of implementing `AggregateStore` with the
//! same version semantics.

pub mod memory;

pub use memory::MemoryStore;
