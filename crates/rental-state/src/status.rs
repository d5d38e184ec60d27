//! # Loan Status and Actor Role
//!
//! The closed set of loan lifecycle states and the two parties that may
//! drive a loan through them.
//!
//! ## States
//!
//! ```text
//!                 ┌──────────▶ Denied (terminal)
//!                 │
//! Inquired ──▶ Accepted ──▶ PreparedForPickup ──▶ Active ──▶ PreparedForReturn ──▶ Returned (terminal)
//!    │            │   │            │   ▲            ▲               │   ▲
//!    │            │   │            ▼   │            │               ▼   │
//!    │            │   │        PickupDenied         │          ReturnDenied
//!    │            │   └─────────────────────────────┘
//!    ▼            ▼
//! Cancelled (terminal, also reachable from PreparedForPickup and PickupDenied)
//! ```

use std::str::FromStr;

use rental_core::ValidationError;
use serde::{Deserialize, Serialize};

// ─── Loan Status ─────────────────────────────────────────────────────

/// The lifecycle state of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    /// The tenant has asked to borrow the item (initial).
    Inquired,
    /// The owner agreed to lend the item.
    Accepted,
    /// The owner refused the inquiry (terminal).
    Denied,
    /// One of the parties withdrew before the item changed hands (terminal).
    Cancelled,
    /// The owner documented the hand-off and awaits the tenant's confirmation.
    PreparedForPickup,
    /// The tenant disputed the pickup protocol.
    PickupDenied,
    /// The tenant has the item.
    Active,
    /// The owner documented the return and awaits the tenant's confirmation.
    PreparedForReturn,
    /// The tenant disputed the return protocol.
    ReturnDenied,
    /// The item is back with the owner (terminal).
    Returned,
}

impl LoanStatus {
    /// Number of lifecycle states.
    pub const COUNT: usize = 10;

    /// Every state, in declaration order.
    pub const ALL: [LoanStatus; Self::COUNT] = [
        Self::Inquired,
        Self::Accepted,
        Self::Denied,
        Self::Cancelled,
        Self::PreparedForPickup,
        Self::PickupDenied,
        Self::Active,
        Self::PreparedForReturn,
        Self::ReturnDenied,
        Self::Returned,
    ];

    /// Canonical wire/log name (e.g. `PREPARED_FOR_PICKUP`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inquired => "INQUIRED",
            Self::Accepted => "ACCEPTED",
            Self::Denied => "DENIED",
            Self::Cancelled => "CANCELLED",
            Self::PreparedForPickup => "PREPARED_FOR_PICKUP",
            Self::PickupDenied => "PICKUP_DENIED",
            Self::Active => "ACTIVE",
            Self::PreparedForReturn => "PREPARED_FOR_RETURN",
            Self::ReturnDenied => "RETURN_DENIED",
            Self::Returned => "RETURNED",
        }
    }

    /// The only state a new loan can be created in.
    pub fn is_initial(&self) -> bool {
        matches!(self, Self::Inquired)
    }

    /// No party can move the loan anywhere else from here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Denied | Self::Cancelled | Self::Returned)
    }

    /// A dispute state from which the owner can try the hand-off again.
    pub fn is_retry_capable(&self) -> bool {
        matches!(self, Self::PickupDenied | Self::ReturnDenied)
    }

    /// A transient state on the happy path between inquiry and return.
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            Self::Accepted | Self::PreparedForPickup | Self::Active | Self::PreparedForReturn
        )
    }

    fn expected_names() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = ValidationError;

    /// Accepts `PREPARED_FOR_PICKUP`, `prepared-for-pickup`, and
    /// `PreparedForPickup`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_uppercase)
            .collect();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().replace('_', "") == normalized)
            .ok_or_else(|| ValidationError::UnknownVariant {
                kind: "loan status",
                value: s.to_string(),
                expected: Self::expected_names(),
            })
    }
}

// ─── Actor Role ──────────────────────────────────────────────────────

/// The party requesting a transition.
///
/// Resolved by the caller before the state machine runs; the state
/// machine trusts it and never re-derives identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// The lender, who owns the item.
    Owner,
    /// The borrower.
    Tenant,
}

impl ActorRole {
    /// Both roles, owner first.
    pub const ALL: [ActorRole; 2] = [Self::Owner, Self::Tenant];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Tenant => "tenant",
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "tenant" => Ok(Self::Tenant),
            _ => Err(ValidationError::UnknownVariant {
                kind: "actor role",
                value: s.to_string(),
                expected: "owner, tenant".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_lists_every_state_once() {
        let mut seen = std::collections::HashSet::new();
        for status in LoanStatus::ALL {
            assert!(seen.insert(status), "{status} listed twice");
        }
        assert_eq!(seen.len(), LoanStatus::COUNT);
    }

    #[test]
    fn classification_partitions_states() {
        for status in LoanStatus::ALL {
            let classes = [
                status.is_initial(),
                status.is_terminal(),
                status.is_retry_capable(),
                status.is_operational(),
            ];
            assert_eq!(
                classes.iter().filter(|c| **c).count(),
                1,
                "{status} must belong to exactly one class"
            );
        }
    }

    #[test]
    fn terminal_states() {
        assert!(LoanStatus::Denied.is_terminal());
        assert!(LoanStatus::Cancelled.is_terminal());
        assert!(LoanStatus::Returned.is_terminal());
        assert!(!LoanStatus::ReturnDenied.is_terminal());
        assert!(!LoanStatus::Inquired.is_terminal());
    }

    #[test]
    fn parse_accepts_canonical_and_variant_names() {
        assert_eq!(
            "PREPARED_FOR_PICKUP".parse::<LoanStatus>().unwrap(),
            LoanStatus::PreparedForPickup
        );
        assert_eq!(
            "prepared-for-pickup".parse::<LoanStatus>().unwrap(),
            LoanStatus::PreparedForPickup
        );
        assert_eq!(
            "ReturnDenied".parse::<LoanStatus>().unwrap(),
            LoanStatus::ReturnDenied
        );
        assert_eq!(" returned ".parse::<LoanStatus>().unwrap(), LoanStatus::Returned);
    }

    #[test]
    fn parse_rejects_unknown_status() {
        let err = "LOST".parse::<LoanStatus>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("LOST"));
        assert!(msg.contains("INQUIRED"));
    }

    #[test]
    fn display_matches_serde_name() {
        for status in LoanStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
            assert_eq!(status.to_string().parse::<LoanStatus>().unwrap(), status);
        }
    }

    #[test]
    fn actor_role_parse_and_serde() {
        assert_eq!("Owner".parse::<ActorRole>().unwrap(), ActorRole::Owner);
        assert_eq!("tenant".parse::<ActorRole>().unwrap(), ActorRole::Tenant);
        assert!("renter".parse::<ActorRole>().is_err());
        assert_eq!(
            serde_json::to_string(&ActorRole::Tenant).unwrap(),
            "\"tenant\""
        );
    }
}
