//! Strongly-typed identifiers for ledger entities
//!
//! Newtype wrappers around UUIDs prevent accidental mixing of different
//! identifier types (a PaymentId is not a SettlementId even though both
//! are UUIDs underneath).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Booking aggregate
define_id!(BookingId, "BKG");
define_id!(PaymentId, "PAY");
define_id!(InstalmentId, "INS");
define_id!(CostItemId, "CST");
define_id!(AmendmentId, "AMD");

// Credit notes
define_id!(CreditNoteId, "CRN");

// Cancellations
define_id!(CancellationId, "CXL");

// Payables and settlements
define_id!(PayableId, "PBL");
define_id!(SettlementId, "STL");

// Commissions
define_id!(CommissionEntryId, "CMS");
define_id!(AgentId, "AGT");
