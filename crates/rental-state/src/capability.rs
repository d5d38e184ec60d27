//! Capability queries: what may be done to a loan's auxiliary documents
//! in a given state, independent of which party asks.

use serde::{Deserialize, Serialize};

use crate::policy::TransitionPolicy;
use crate::status::LoanStatus;

/// All capability gates for one state, as a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub status: LoanStatus,
    pub create_pickup_protocol: bool,
    pub update_pickup_protocol: bool,
    pub create_return_protocol: bool,
    pub update_return_protocol: bool,
    pub create_review: bool,
}

/// Stateless view over the per-state capability gates.
pub struct CapabilityQuery;

impl CapabilityQuery {
    pub fn can_create_pickup_protocol(status: LoanStatus) -> bool {
        TransitionPolicy::of(status).can_create_pickup_protocol()
    }

    pub fn can_update_pickup_protocol(status: LoanStatus) -> bool {
        TransitionPolicy::of(status).can_update_pickup_protocol()
    }

    pub fn can_create_return_protocol(status: LoanStatus) -> bool {
        TransitionPolicy::of(status).can_create_return_protocol()
    }

    pub fn can_update_return_protocol(status: LoanStatus) -> bool {
        TransitionPolicy::of(status).can_update_return_protocol()
    }

    pub fn can_create_review(status: LoanStatus) -> bool {
        TransitionPolicy::of(status).can_create_review()
    }

    /// Every gate for `status` at once.
    pub fn snapshot(status: LoanStatus) -> Capabilities {
        let policy = TransitionPolicy::of(status);
        Capabilities {
            status,
            create_pickup_protocol: policy.can_create_pickup_protocol(),
            update_pickup_protocol: policy.can_update_pickup_protocol(),
            create_return_protocol: policy.can_create_return_protocol(),
            update_return_protocol: policy.can_update_return_protocol(),
            create_review: policy.can_create_review(),
        }
    }
}
