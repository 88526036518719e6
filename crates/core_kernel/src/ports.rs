//! Aggregate store port
//!
//! The engine is synchronous and storage-agnostic: it only requires
//! read-modify-write with per-aggregate versioning. Each mutation loads
//! an aggregate together with its version and commits back with that
//! version; a stale version means another writer got there first and the
//! commit must fail with `LedgerError::Conflict`, never overwrite.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::LedgerError;

/// Monotonic per-aggregate version used for optimistic concurrency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Version assigned to a freshly-inserted aggregate
    pub fn initial() -> Self {
        Self(1)
    }

    /// The version after one successful update
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// An aggregate snapshot paired with the version it was read at
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub version: Version,
    pub value: T,
}

/// Storage port for one aggregate-root type
///
/// Implementations must make `update` atomic with respect to concurrent
/// callers: of two writers racing with the same expected version,
/// exactly one succeeds and the other observes `Conflict`.
pub trait AggregateStore<T: Clone>: Send + Sync {
    /// Aggregate name used in `Conflict`/`NotFound` errors
    fn kind(&self) -> &'static str;

    fn get(&self, id: Uuid) -> Result<Versioned<T>, LedgerError>;

    /// Inserts a new aggregate; fails with `InvalidState` if the id exists
    fn insert(&self, id: Uuid, value: T) -> Result<Version, LedgerError>;

    /// Commits a mutation read at `expected`; fails with `Conflict` on a
    /// stale version
    fn update(&self, id: Uuid, expected: Version, value: T) -> Result<Version, LedgerError>;

    /// Commits several mutations as one all-or-nothing write: if any
    /// version is stale, nothing is applied
    fn update_many(&self, writes: Vec<(Uuid, Version, T)>) -> Result<(), LedgerError>;

    fn list(&self) -> Vec<(Uuid, Versioned<T>)>;
}
