//! # Check Subcommand
//!
//! Evaluates a single transition request offline, the same way the API
//! does, and reports the outcome.
//!
//! ```text
//! rental check --from ACCEPTED --actor owner --to PREPARED_FOR_PICKUP --pickup-protocol
//! ```
//!
//! Prints `ALLOWED` and exits 0, or fails with the rejection message.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;

use rental_state::{ActorRole, LoanFacts, LoanStateMachine, LoanStatus};

/// Arguments for `rental check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Current loan status.
    #[arg(long)]
    pub from: LoanStatus,

    /// Party making the request.
    #[arg(long)]
    pub actor: ActorRole,

    /// Requested status.
    #[arg(long)]
    pub to: LoanStatus,

    /// Treat the loan as having a pickup protocol attached.
    #[arg(long)]
    pub pickup_protocol: bool,

    /// Treat the loan as having a return protocol attached.
    #[arg(long)]
    pub return_protocol: bool,
}

impl CheckArgs {
    fn facts(&self) -> LoanFacts {
        let mut facts = LoanFacts::none();
        if self.pickup_protocol {
            facts = facts.with_pickup_protocol();
        }
        if self.return_protocol {
            facts = facts.with_return_protocol();
        }
        facts
    }
}

/// Execute `rental check`.
///
/// A rejection is returned as an error carrying the state machine's
/// message, so the binary exits non-zero.
pub fn run_check(args: &CheckArgs, out: &mut dyn Write) -> Result<()> {
    let facts = args.facts();
    tracing::debug!(
        from = %args.from,
        to = %args.to,
        actor = %args.actor,
        pickup_protocol = facts.pickup_protocol_present,
        return_protocol = facts.return_protocol_present,
        "checking transition"
    );

    match LoanStateMachine::decide(args.from, &facts, args.actor, args.to) {
        Ok(()) => {
            writeln!(out, "ALLOWED").context("failed to write result")?;
            Ok(())
        }
        Err(err) => {
            tracing::debug!(reason = %err.reason(), "transition rejected");
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rental_state::{RejectionReason, TransitionError};

    fn args(from: LoanStatus, actor: ActorRole, to: LoanStatus) -> CheckArgs {
        CheckArgs {
            from,
            actor,
            to,
            pickup_protocol: false,
            return_protocol: false,
        }
    }

    fn reason_of(err: anyhow::Error) -> RejectionReason {
        err.downcast_ref::<TransitionError>()
            .expect("should be a transition error")
            .reason()
    }

    #[test]
    fn allowed_request_prints_allowed() {
        let mut buf = Vec::new();
        run_check(
            &args(LoanStatus::Inquired, ActorRole::Owner, LoanStatus::Accepted),
            &mut buf,
        )
        .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "ALLOWED\n");
    }

    #[test]
    fn self_transition_is_allowed() {
        let mut buf = Vec::new();
        run_check(
            &args(LoanStatus::Returned, ActorRole::Tenant, LoanStatus::Returned),
            &mut buf,
        )
        .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "ALLOWED\n");
    }

    #[test]
    fn wrong_actor_is_rejected() {
        let mut buf = Vec::new();
        let err = run_check(
            &args(LoanStatus::Inquired, ActorRole::Tenant, LoanStatus::Accepted),
            &mut buf,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not permitted"));
        assert_eq!(reason_of(err), RejectionReason::NotPermitted);
        assert!(buf.is_empty());
    }

    #[test]
    fn missing_protocol_fails_the_precondition() {
        let mut buf = Vec::new();
        let err = run_check(
            &args(
                LoanStatus::Accepted,
                ActorRole::Owner,
                LoanStatus::PreparedForPickup,
            ),
            &mut buf,
        )
        .unwrap_err();
        assert!(err.to_string().contains("create a pickup protocol first"));
        assert_eq!(reason_of(err), RejectionReason::PreconditionNotMet);
    }

    #[test]
    fn protocol_flag_satisfies_the_precondition() {
        let mut request = args(
            LoanStatus::Active,
            ActorRole::Owner,
            LoanStatus::PreparedForReturn,
        );
        request.return_protocol = true;
        let mut buf = Vec::new();
        run_check(&request, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "ALLOWED\n");
    }

    #[test]
    fn wrong_protocol_flag_does_not_help() {
        let mut request = args(
            LoanStatus::Active,
            ActorRole::Owner,
            LoanStatus::PreparedForReturn,
        );
        request.pickup_protocol = true;
        let err = run_check(&request, &mut Vec::new()).unwrap_err();
        assert_eq!(reason_of(err), RejectionReason::PreconditionNotMet);
    }
}
