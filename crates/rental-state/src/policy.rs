//! # Transition Policy
//!
//! For each loan state, the complete set of targets each party may request
//! and the capability gates that state opens.
//!
//! The policy is a pure function of `(current state, actor, target)`. It
//! knows nothing about protocols, persistence, or identity; auxiliary
//! preconditions are evaluated separately by
//! [`ProtocolGuard`](crate::guard::ProtocolGuard).
//!
//! ## Table
//!
//! | Current             | Tenant may move to       | Owner may move to                      |
//! |---------------------|--------------------------|----------------------------------------|
//! | INQUIRED            | CANCELLED                | ACCEPTED, DENIED                       |
//! | ACCEPTED            | CANCELLED                | CANCELLED, ACTIVE, PREPARED_FOR_PICKUP |
//! | DENIED              | —                        | —                                      |
//! | CANCELLED           | —                        | —                                      |
//! | PREPARED_FOR_PICKUP | ACTIVE, PICKUP_DENIED    | CANCELLED                              |
//! | PICKUP_DENIED       | CANCELLED                | PREPARED_FOR_PICKUP, CANCELLED         |
//! | ACTIVE              | —                        | PREPARED_FOR_RETURN                    |
//! | PREPARED_FOR_RETURN | RETURNED, RETURN_DENIED  | —                                      |
//! | RETURN_DENIED       | —                        | PREPARED_FOR_RETURN                    |
//! | RETURNED            | —                        | —                                      |
//!
//! Every state additionally permits the self-transition for both parties.
//! There is no transitivity: a target reachable from elsewhere in the
//! lifecycle is still rejected unless listed for the current state.
//!
//! ## Lookup
//!
//! Each state has one `const` policy. [`TransitionPolicy::of`] is an
//! exhaustive `match`, so adding a `LoanStatus` variant without a policy
//! is a compile error rather than a runtime lookup failure.

use serde::{Deserialize, Serialize};

use crate::status::{ActorRole, LoanStatus};

/// Outcome of a bare policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionDecision {
    /// The actor may request this target from the current state.
    Allowed,
    /// The actor may not request this target from the current state.
    Denied,
}

impl TransitionDecision {
    /// Whether the decision permits the transition.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    fn from_bool(allowed: bool) -> Self {
        if allowed {
            Self::Allowed
        } else {
            Self::Denied
        }
    }
}

/// Transition rules and capability gates for one loan state.
#[derive(Debug, PartialEq, Eq)]
pub struct TransitionPolicy {
    status: LoanStatus,
    tenant_targets: &'static [LoanStatus],
    owner_targets: &'static [LoanStatus],
    create_pickup_protocol: bool,
    update_pickup_protocol: bool,
    create_return_protocol: bool,
    update_return_protocol: bool,
    create_review: bool,
}

// ─── Per-State Policies ──────────────────────────────────────────────

const NO_TARGETS: &[LoanStatus] = &[];

const INQUIRED: TransitionPolicy = TransitionPolicy {
    status: LoanStatus::Inquired,
    tenant_targets: &[LoanStatus::Cancelled],
    owner_targets: &[LoanStatus::Accepted, LoanStatus::Denied],
    create_pickup_protocol: false,
    update_pickup_protocol: false,
    create_return_protocol: false,
    update_return_protocol: false,
    create_review: false,
};

const ACCEPTED: TransitionPolicy = TransitionPolicy {
    status: LoanStatus::Accepted,
    tenant_targets: &[LoanStatus::Cancelled],
    owner_targets: &[
        LoanStatus::Cancelled,
        LoanStatus::Active,
        LoanStatus::PreparedForPickup,
    ],
    create_pickup_protocol: true,
    update_pickup_protocol: true,
    create_return_protocol: false,
    update_return_protocol: false,
    create_review: false,
};

const DENIED: TransitionPolicy = TransitionPolicy {
    status: LoanStatus::Denied,
    tenant_targets: NO_TARGETS,
    owner_targets: NO_TARGETS,
    create_pickup_protocol: false,
    update_pickup_protocol: false,
    create_return_protocol: false,
    update_return_protocol: false,
    create_review: true,
};

const CANCELLED: TransitionPolicy = TransitionPolicy {
    status: LoanStatus::Cancelled,
    tenant_targets: NO_TARGETS,
    owner_targets: NO_TARGETS,
    create_pickup_protocol: false,
    update_pickup_protocol: false,
    create_return_protocol: false,
    update_return_protocol: false,
    create_review: true,
};

// The tenant confirms the hand-off or disputes the protocol; the owner can
// only withdraw.
const PREPARED_FOR_PICKUP: TransitionPolicy = TransitionPolicy {
    status: LoanStatus::PreparedForPickup,
    tenant_targets: &[LoanStatus::Active, LoanStatus::PickupDenied],
    owner_targets: &[LoanStatus::Cancelled],
    create_pickup_protocol: false,
    update_pickup_protocol: false,
    create_return_protocol: false,
    update_return_protocol: false,
    create_review: false,
};

const PICKUP_DENIED: TransitionPolicy = TransitionPolicy {
    status: LoanStatus::PickupDenied,
    tenant_targets: &[LoanStatus::Cancelled],
    owner_targets: &[LoanStatus::PreparedForPickup, LoanStatus::Cancelled],
    create_pickup_protocol: false,
    update_pickup_protocol: true,
    create_return_protocol: false,
    update_return_protocol: false,
    create_review: false,
};

const ACTIVE: TransitionPolicy = TransitionPolicy {
    status: LoanStatus::Active,
    tenant_targets: NO_TARGETS,
    owner_targets: &[LoanStatus::PreparedForReturn],
    create_pickup_protocol: false,
    update_pickup_protocol: false,
    create_return_protocol: true,
    update_return_protocol: true,
    create_review: false,
};

// The owner cannot mark the item returned on their own; the tenant has
// to confirm or dispute.
const PREPARED_FOR_RETURN: TransitionPolicy = TransitionPolicy {
    status: LoanStatus::PreparedForReturn,
    tenant_targets: &[LoanStatus::Returned, LoanStatus::ReturnDenied],
    owner_targets: NO_TARGETS,
    create_pickup_protocol: false,
    update_pickup_protocol: false,
    create_return_protocol: false,
    update_return_protocol: false,
    create_review: false,
};

const RETURN_DENIED: TransitionPolicy = TransitionPolicy {
    status: LoanStatus::ReturnDenied,
    tenant_targets: NO_TARGETS,
    owner_targets: &[LoanStatus::PreparedForReturn],
    create_pickup_protocol: false,
    update_pickup_protocol: false,
    create_return_protocol: false,
    update_return_protocol: true,
    create_review: false,
};

const RETURNED: TransitionPolicy = TransitionPolicy {
    status: LoanStatus::Returned,
    tenant_targets: NO_TARGETS,
    owner_targets: NO_TARGETS,
    create_pickup_protocol: false,
    update_pickup_protocol: false,
    create_return_protocol: false,
    update_return_protocol: false,
    create_review: true,
};

impl TransitionPolicy {
    /// The policy governing loans currently in `status`.
    pub fn of(status: LoanStatus) -> &'static TransitionPolicy {
        match status {
            LoanStatus::Inquired => &INQUIRED,
            LoanStatus::Accepted => &ACCEPTED,
            LoanStatus::Denied => &DENIED,
            LoanStatus::Cancelled => &CANCELLED,
            LoanStatus::PreparedForPickup => &PREPARED_FOR_PICKUP,
            LoanStatus::PickupDenied => &PICKUP_DENIED,
            LoanStatus::Active => &ACTIVE,
            LoanStatus::PreparedForReturn => &PREPARED_FOR_RETURN,
            LoanStatus::ReturnDenied => &RETURN_DENIED,
            LoanStatus::Returned => &RETURNED,
        }
    }

    /// The state this policy governs.
    pub fn status(&self) -> LoanStatus {
        self.status
    }

    /// Decide whether `actor` may move a loan in this state to `target`.
    pub fn evaluate(&self, actor: ActorRole, target: LoanStatus) -> TransitionDecision {
        match actor {
            ActorRole::Tenant => self.evaluate_as_tenant(target),
            ActorRole::Owner => self.evaluate_as_owner(target),
        }
    }

    /// Decide whether the tenant may move a loan in this state to `target`.
    pub fn evaluate_as_tenant(&self, target: LoanStatus) -> TransitionDecision {
        TransitionDecision::from_bool(
            target == self.status || self.tenant_targets.contains(&target),
        )
    }

    /// Decide whether the owner may move a loan in this state to `target`.
    pub fn evaluate_as_owner(&self, target: LoanStatus) -> TransitionDecision {
        TransitionDecision::from_bool(target == self.status || self.owner_targets.contains(&target))
    }

    /// Every target `actor` may request from this state, self first.
    pub fn allowed_targets(&self, actor: ActorRole) -> Vec<LoanStatus> {
        let explicit = match actor {
            ActorRole::Tenant => self.tenant_targets,
            ActorRole::Owner => self.owner_targets,
        };
        std::iter::once(self.status)
            .chain(explicit.iter().copied())
            .collect()
    }

    /// Whether a pickup protocol may be created for a loan in this state.
    pub fn can_create_pickup_protocol(&self) -> bool {
        self.create_pickup_protocol
    }

    /// Whether an existing pickup protocol may be edited in this state.
    pub fn can_update_pickup_protocol(&self) -> bool {
        self.update_pickup_protocol
    }

    /// Whether a return protocol may be created for a loan in this state.
    pub fn can_create_return_protocol(&self) -> bool {
        self.create_return_protocol
    }

    /// Whether an existing return protocol may be edited in this state.
    pub fn can_update_return_protocol(&self) -> bool {
        self.update_return_protocol
    }

    /// Whether either party may review the other for a loan in this state.
    pub fn can_create_review(&self) -> bool {
        self.create_review
    }
}

/// Decide whether the tenant may move a loan from `current` to `target`.
pub fn evaluate_as_tenant(current: LoanStatus, target: LoanStatus) -> TransitionDecision {
    TransitionPolicy::of(current).evaluate_as_tenant(target)
}

/// Decide whether the owner may move a loan from `current` to `target`.
pub fn evaluate_as_owner(current: LoanStatus, target: LoanStatus) -> TransitionDecision {
    TransitionPolicy::of(current).evaluate_as_owner(target)
}
