//! # Identity Newtypes
//!
//! Newtype wrappers for the identifiers of the rental service.
//! These prevent accidental identifier confusion: you cannot pass
//! a `UserId` where a `LoanId` is expected.
//!
//! All identifiers are UUID v4. `Display` prefixes the namespace
//! (`loan:…`, `user:…`) for log readability; `FromStr` accepts the bare
//! UUID as it appears in URLs and request bodies.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Unique identifier for a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(pub Uuid);

/// Unique identifier for a loanable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

/// Unique identifier for a user (owner or tenant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

/// Unique identifier for a pickup or return protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolId(pub Uuid);

macro_rules! impl_identifier {
    ($ty:ident, $prefix:literal) => {
        impl $ty {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|e| ValidationError::InvalidIdentifier {
                        kind: $prefix,
                        value: s.to_string(),
                        reason: e.to_string(),
                    })
            }
        }
    };
}

impl_identifier!(LoanId, "loan");
impl_identifier!(ItemId, "item");
impl_identifier!(UserId, "user");
impl_identifier!(ProtocolId, "protocol");
