//! # Loan State Machine
//!
//! Single entry point for moving a loan between states. Composes the
//! per-state [`TransitionPolicy`] with the [`ProtocolGuard`] and performs
//! the mutation only when both agree.
//!
//! ## Algorithm
//!
//! 1. Look up the policy for the loan's current status (total, cannot fail).
//! 2. Ask the policy whether the actor may request the target. If not,
//!    reject with [`RejectionReason::NotPermitted`].
//! 3. Run the guard against the loan's protocol facts. If a required
//!    protocol is missing, reject with [`RejectionReason::PreconditionNotMet`].
//! 4. Set the new status, bump the version and `updated_at`, and append a
//!    [`LoanTransitionRecord`](crate::loan::LoanTransitionRecord).
//!
//! A self-transition passes steps 1–3 for every state and actor and then
//! leaves the loan untouched. A rejected request never mutates the loan.

use rental_core::LoanId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::guard::{GuardOutcome, LoanFacts, Precondition, ProtocolGuard, Transition};
use crate::loan::Loan;
use crate::policy::TransitionPolicy;
use crate::status::{ActorRole, LoanStatus};

// ─── Errors ──────────────────────────────────────────────────────────

/// Why a transition request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    NotPermitted,
    PreconditionNotMet,
    ConcurrentModification,
}

impl RejectionReason {
    /// Stable machine-readable code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotPermitted => "TRANSITION_REJECTED",
            Self::PreconditionNotMet => "PRECONDITION_UNSATISFIED",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A refused transition. Nothing was mutated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The policy for the current state does not list this target for the actor.
    #[error("{actor} may not move loan from {from} to {to}: not permitted for this actor in this state")]
    Rejected {
        from: LoanStatus,
        to: LoanStatus,
        actor: ActorRole,
    },

    /// The policy allows it but an auxiliary fact is missing.
    #[error("{actor} may not move loan from {from} to {to}: precondition not met ({precondition})")]
    PreconditionUnsatisfied {
        from: LoanStatus,
        to: LoanStatus,
        actor: ActorRole,
        precondition: Precondition,
    },

    /// The loan changed between load and apply.
    #[error("{loan_id} was modified concurrently (expected version {expected_version}, found {actual_version})")]
    ConcurrentModification {
        loan_id: LoanId,
        expected_version: u64,
        actual_version: u64,
    },
}

impl TransitionError {
    pub fn reason(&self) -> RejectionReason {
        match self {
            Self::Rejected { .. } => RejectionReason::NotPermitted,
            Self::PreconditionUnsatisfied { .. } => RejectionReason::PreconditionNotMet,
            Self::ConcurrentModification { .. } => RejectionReason::ConcurrentModification,
        }
    }
}

// ─── Facade ──────────────────────────────────────────────────────────

/// Applies actor-tagged transition requests to loans.
pub struct LoanStateMachine;

impl LoanStateMachine {
    /// Decide a request without touching any loan.
    pub fn decide(
        current: LoanStatus,
        facts: &LoanFacts,
        actor: ActorRole,
        target: LoanStatus,
    ) -> Result<(), TransitionError> {
        let policy = TransitionPolicy::of(current);
        if !policy.evaluate(actor, target).is_allowed() {
            return Err(TransitionError::Rejected {
                from: current,
                to: target,
                actor,
            });
        }
        let transition = Transition::new(current, target, actor);
        match ProtocolGuard::check(&transition, facts) {
            GuardOutcome::Satisfied => Ok(()),
            GuardOutcome::Unsatisfied(precondition) => {
                Err(TransitionError::PreconditionUnsatisfied {
                    from: current,
                    to: target,
                    actor,
                    precondition,
                })
            }
        }
    }

    /// Move `loan` to `target` on behalf of `actor`.
    pub fn apply(
        loan: &mut Loan,
        actor: ActorRole,
        target: LoanStatus,
    ) -> Result<&Loan, TransitionError> {
        let current = loan.status();
        Self::decide(current, &loan.facts(), actor, target)?;
        if target != current {
            loan.record_transition(target, actor);
        }
        Ok(&*loan)
    }

    /// Like [`apply`](Self::apply), but first require that the loan is still
    /// at `expected_version`.
    pub fn apply_expecting(
        loan: &mut Loan,
        expected_version: u64,
        actor: ActorRole,
        target: LoanStatus,
    ) -> Result<&Loan, TransitionError> {
        if loan.version() != expected_version {
            return Err(TransitionError::ConcurrentModification {
                loan_id: loan.id,
                expected_version,
                actual_version: loan.version(),
            });
        }
        Self::apply(loan, actor, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rental_core::{ItemId, ProtocolId, UserId};

    fn loan() -> Loan {
        Loan::inquire(ItemId::new(), UserId::new(), UserId::new())
    }

    #[test]
    fn tenant_cancels_inquiry() {
        let mut l = loan();
        let updated = LoanStateMachine::apply(&mut l, ActorRole::Tenant, LoanStatus::Cancelled)
            .unwrap();
        assert_eq!(updated.status(), LoanStatus::Cancelled);
        assert_eq!(l.version(), 1);
        assert_eq!(l.transitions().len(), 1);
    }

    #[test]
    fn rejected_request_leaves_loan_untouched() {
        let mut l = loan();
        let before = l.clone();
        let err = LoanStateMachine::apply(&mut l, ActorRole::Tenant, LoanStatus::Accepted)
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::Rejected {
                from: LoanStatus::Inquired,
                to: LoanStatus::Accepted,
                actor: ActorRole::Tenant,
            }
        );
        assert_eq!(err.reason(), RejectionReason::NotPermitted);
        assert_eq!(l, before);
    }

    #[test]
    fn pickup_preparation_needs_protocol() {
        let mut l = loan();
        LoanStateMachine::apply(&mut l, ActorRole::Owner, LoanStatus::Accepted).unwrap();
        let before = l.clone();

        let err = LoanStateMachine::apply(&mut l, ActorRole::Owner, LoanStatus::PreparedForPickup)
            .unwrap_err();
        assert_eq!(err.reason(), RejectionReason::PreconditionNotMet);
        assert!(err.to_string().contains("create a pickup protocol first"));
        assert_eq!(l, before);

        l.attach_pickup_protocol(ProtocolId::new()).unwrap();
        LoanStateMachine::apply(&mut l, ActorRole::Owner, LoanStatus::PreparedForPickup).unwrap();
        assert_eq!(l.status(), LoanStatus::PreparedForPickup);
    }

    #[test]
    fn policy_rejection_takes_precedence_over_guard() {
        let err = LoanStateMachine::decide(
            LoanStatus::Accepted,
            &LoanFacts::none(),
            ActorRole::Tenant,
            LoanStatus::PreparedForPickup,
        )
        .unwrap_err();
        assert_eq!(err.reason(), RejectionReason::NotPermitted);
    }

    #[test]
    fn self_transition_is_a_no_op() {
        let mut l = loan();
        let before = l.clone();
        LoanStateMachine::apply(&mut l, ActorRole::Tenant, LoanStatus::Inquired).unwrap();
        LoanStateMachine::apply(&mut l, ActorRole::Owner, LoanStatus::Inquired).unwrap();
        assert_eq!(l, before);
    }

    #[test]
    fn apply_expecting_detects_stale_version() {
        let mut l = loan();
        LoanStateMachine::apply(&mut l, ActorRole::Owner, LoanStatus::Accepted).unwrap();
        let err = LoanStateMachine::apply_expecting(&mut l, 0, ActorRole::Owner, LoanStatus::Active)
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::ConcurrentModification {
                loan_id: l.id,
                expected_version: 0,
                actual_version: 1,
            }
        );
        assert_eq!(l.status(), LoanStatus::Accepted);

        LoanStateMachine::apply_expecting(&mut l, 1, ActorRole::Owner, LoanStatus::Active).unwrap();
        assert_eq!(l.status(), LoanStatus::Active);
    }

    #[test]
    fn reason_codes_are_stable() {
        assert_eq!(RejectionReason::NotPermitted.as_str(), "TRANSITION_REJECTED");
        assert_eq!(
            RejectionReason::PreconditionNotMet.as_str(),
            "PRECONDITION_UNSATISFIED"
        );
        assert_eq!(
            RejectionReason::ConcurrentModification.as_str(),
            "CONCURRENT_MODIFICATION"
        );
    }
}
