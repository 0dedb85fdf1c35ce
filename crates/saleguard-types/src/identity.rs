//! Identity types for Saleguard
//!
//! Caller identities are strongly typed wrappers around UUIDs to prevent
//! accidental mixing of different ID types. Agreement identifiers are the
//! exception: they form a dense, monotonically increasing sequence starting
//! at 0 and are owned exclusively by the ledger's counter.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Macro to generate UUID-backed ID types with common implementations
macro_rules! define_id_type {
    ($name:ident, $prefix:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse from a string (with or without prefix)
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                let s = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }

            /// Get the inner UUID
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
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id_type!(PartyId, "party", "Unique identifier for a caller identity (seller, buyer, or escrow agent)");
define_id_type!(TokenId, "token", "Unique identifier for a fungible token contract");

/// Identifier of an agreement in the ledger.
///
/// Unlike party and token IDs, agreement IDs are sequential: the ledger
/// allocates them densely starting at 0, one per created agreement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AgreementId(pub u64);

impl AgreementId {
    /// The first identifier the ledger allocates
    pub const FIRST: AgreementId = AgreementId(0);

    /// The identifier allocated after this one
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for AgreementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agreement_{}", self.0)
    }
}

impl From<u64> for AgreementId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
