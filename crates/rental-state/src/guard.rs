//! # Protocol Guard
//!
//! Auxiliary preconditions that sit on top of the transition policy. A
//! transition can be allowed by the policy for the requesting actor and
//! still be refused here because the loan lacks a document the target
//! state depends on.
//!
//! | Target              | Required fact                |
//! |---------------------|------------------------------|
//! | PREPARED_FOR_PICKUP | a pickup protocol is present |
//! | PREPARED_FOR_RETURN | a return protocol is present |
//!
//! Rules fire only for real transitions. A self-transition never needs
//! a precondition, so a loan already in `PREPARED_FOR_PICKUP` can be
//! re-saved even if its protocol has since gone missing.

use serde::{Deserialize, Serialize};

use crate::status::{ActorRole, LoanStatus};

/// Facts about a loan's auxiliary documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanFacts {
    /// A pickup protocol has been attached.
    pub pickup_protocol_present: bool,
    /// A return protocol has been attached.
    pub return_protocol_present: bool,
}

impl LoanFacts {
    /// Facts for a loan with neither protocol.
    pub fn none() -> Self {
        Self::default()
    }

    /// Facts with the pickup protocol present.
    pub fn with_pickup_protocol(mut self) -> Self {
        self.pickup_protocol_present = true;
        self
    }

    /// Facts with the return protocol present.
    pub fn with_return_protocol(mut self) -> Self {
        self.return_protocol_present = true;
        self
    }
}

/// A requested move of a loan from one state to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    pub from: LoanStatus,
    pub to: LoanStatus,
    pub actor: ActorRole,
}

impl Transition {
    pub fn new(from: LoanStatus, to: LoanStatus, actor: ActorRole) -> Self {
        Self { from, to, actor }
    }

    /// Whether the transition leaves the loan where it is.
    pub fn is_self(&self) -> bool {
        self.from == self.to
    }
}

/// A named auxiliary requirement a transition may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precondition {
    PickupProtocolRequired,
    ReturnProtocolRequired,
}

impl Precondition {
    /// User-facing remediation hint.
    pub fn message(&self) -> &'static str {
        match self {
            Self::PickupProtocolRequired => "create a pickup protocol first",
            Self::ReturnProtocolRequired => "create a return protocol first",
        }
    }

    fn is_met(&self, facts: &LoanFacts) -> bool {
        match self {
            Self::PickupProtocolRequired => facts.pickup_protocol_present,
            Self::ReturnProtocolRequired => facts.return_protocol_present,
        }
    }
}

impl std::fmt::Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Satisfied,
    Unsatisfied(Precondition),
}

impl GuardOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

/// Evaluates the auxiliary preconditions attached to target states.
pub struct ProtocolGuard;

impl ProtocolGuard {
    /// The precondition a move into `target` depends on, if any.
    pub fn requirement_for(target: LoanStatus) -> Option<Precondition> {
        match target {
            LoanStatus::PreparedForPickup => Some(Precondition::PickupProtocolRequired),
            LoanStatus::PreparedForReturn => Some(Precondition::ReturnProtocolRequired),
            _ => None,
        }
    }

    /// Whether `transition` is subject to any guard rule.
    pub fn is_coupled(transition: &Transition) -> bool {
        !transition.is_self() && Self::requirement_for(transition.to).is_some()
    }

    /// Check `transition` against `facts`.
    pub fn check(transition: &Transition, facts: &LoanFacts) -> GuardOutcome {
        if transition.is_self() {
            return GuardOutcome::Satisfied;
        }
        match Self::requirement_for(transition.to) {
            Some(pre) if !pre.is_met(facts) => GuardOutcome::Unsatisfied(pre),
            _ => GuardOutcome::Satisfied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pickup_requires_protocol() {
        let t = Transition::new(
            LoanStatus::Accepted,
            LoanStatus::PreparedForPickup,
            ActorRole::Owner,
        );
        assert_eq!(
            ProtocolGuard::check(&t, &LoanFacts::none()),
            GuardOutcome::Unsatisfied(Precondition::PickupProtocolRequired)
        );
        assert!(ProtocolGuard::check(&t, &LoanFacts::none().with_pickup_protocol()).is_satisfied());
    }

    #[test]
    fn return_requires_protocol() {
        let t = Transition::new(
            LoanStatus::ReturnDenied,
            LoanStatus::PreparedForReturn,
            ActorRole::Owner,
        );
        assert_eq!(
            ProtocolGuard::check(&t, &LoanFacts::none().with_pickup_protocol()),
            GuardOutcome::Unsatisfied(Precondition::ReturnProtocolRequired)
        );
        assert!(ProtocolGuard::check(&t, &LoanFacts::none().with_return_protocol()).is_satisfied());
    }

    #[test]
    fn self_transition_bypasses_guard() {
        let t = Transition::new(
            LoanStatus::PreparedForPickup,
            LoanStatus::PreparedForPickup,
            ActorRole::Owner,
        );
        assert!(!ProtocolGuard::is_coupled(&t));
        assert!(ProtocolGuard::check(&t, &LoanFacts::none()).is_satisfied());
    }

    #[test]
    fn uncoupled_transitions_always_pass() {
        for target in LoanStatus::ALL {
            let t = Transition::new(LoanStatus::Inquired, target, ActorRole::Owner);
            if ProtocolGuard::is_coupled(&t) {
                continue;
            }
            assert!(ProtocolGuard::check(&t, &LoanFacts::none()).is_satisfied());
        }
    }

    #[test]
    fn coupling_is_limited_to_prepared_states() {
        let coupled: Vec<_> = LoanStatus::ALL
            .into_iter()
            .filter(|s| {
                ProtocolGuard::is_coupled(&Transition::new(
                    LoanStatus::Inquired,
                    *s,
                    ActorRole::Owner,
                ))
            })
            .collect();
        assert_eq!(
            coupled,
            vec![LoanStatus::PreparedForPickup, LoanStatus::PreparedForReturn]
        );
    }

    #[test]
    fn message_names_remediation() {
        assert_eq!(
            Precondition::PickupProtocolRequired.to_string(),
            "create a pickup protocol first"
        );
    }
}
