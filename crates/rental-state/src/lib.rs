//! # rental-state — Loan Lifecycle State Machine
//!
//! Decides which party may move an equipment loan to which state, and
//! performs the move when allowed.
//!
//! ## Components
//!
//! - **Status** (`status.rs`): the ten [`LoanStatus`] values and the two
//!   [`ActorRole`]s.
//!
//! - **Policy** (`policy.rs`): one constant [`TransitionPolicy`] per state,
//!   listing the targets each party may request and the capability gates
//!   that state opens. A pure function of `(state, actor, target)`.
//!
//! - **Guard** (`guard.rs`): [`ProtocolGuard`] checks auxiliary facts the
//!   policy cannot see. Preparing a pickup needs a pickup protocol;
//!   preparing a return needs a return protocol.
//!
//! - **Machine** (`machine.rs`): [`LoanStateMachine`] runs policy then
//!   guard and mutates the [`Loan`] only if both pass.
//!
//! - **Capabilities** (`capability.rs`): [`CapabilityQuery`] answers
//!   "may a protocol or review be created now?" from the status alone.
//!
//! - **Repository** (`repository.rs`): the [`LoanRepository`] collaborator
//!   interface and the load → apply → save helper.
//!
//! ## Invariants
//!
//! - Every status maps to exactly one policy; the lookup is an exhaustive
//!   `match`, so a new status without a policy does not compile.
//! - The self-transition is allowed for every status and actor, and is a
//!   no-op.
//! - A rejected request never mutates the loan.
//! - The status of a [`Loan`] changes only through [`LoanStateMachine`].
//!
//! This crate performs no I/O and does not log. It returns typed errors
//! and leaves reporting to its callers.

pub mod capability;
pub mod guard;
pub mod loan;
pub mod machine;
pub mod policy;
pub mod repository;
pub mod status;

pub use capability::{Capabilities, CapabilityQuery};
pub use guard::{GuardOutcome, LoanFacts, Precondition, ProtocolGuard, Transition};
pub use loan::{Loan, LoanTransitionRecord, ProtocolError, ProtocolKind};
pub use machine::{LoanStateMachine, RejectionReason, TransitionError};
pub use policy::{evaluate_as_owner, evaluate_as_tenant, TransitionDecision, TransitionPolicy};
pub use repository::{
    transition_persisted, LoanRepository, PersistedTransitionError, RepositoryError,
};
pub use status::{ActorRole, LoanStatus};
