//! # Persistence Collaborator
//!
//! The state machine does no I/O. Whoever stores loans implements
//! [`LoanRepository`] and reports a version mismatch on save as
//! [`RepositoryError::Conflict`]; [`transition_persisted`] runs the
//! load → apply → save cycle on top of it.

use rental_core::LoanId;
use thiserror::Error;

use crate::loan::Loan;
use crate::machine::{LoanStateMachine, TransitionError};
use crate::status::{ActorRole, LoanStatus};

/// Errors reported by a loan store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(LoanId),

    /// The stored loan is no longer at the version the caller loaded.
    #[error("{loan_id} changed since it was loaded (expected version {expected_version}, found {actual_version})")]
    Conflict {
        loan_id: LoanId,
        expected_version: u64,
        actual_version: u64,
    },
}

/// Load/save interface with optimistic concurrency.
pub trait LoanRepository {
    fn load(&self, id: &LoanId) -> Result<Loan, RepositoryError>;

    /// Store `loan`, provided the stored copy is still at `expected_version`.
    fn save(&self, loan: &Loan, expected_version: u64) -> Result<(), RepositoryError>;
}

/// Failure of a persisted transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistedTransitionError {
    #[error("{0} not found")]
    NotFound(LoanId),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl From<RepositoryError> for PersistedTransitionError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::NotFound(id),
            RepositoryError::Conflict {
                loan_id,
                expected_version,
                actual_version,
            } => Self::Transition(TransitionError::ConcurrentModification {
                loan_id,
                expected_version,
                actual_version,
            }),
        }
    }
}

/// Load the loan, apply the transition, and save it back.
///
/// A self-transition is not written back since it changes nothing.
pub fn transition_persisted<R>(
    repo: &R,
    id: &LoanId,
    actor: ActorRole,
    target: LoanStatus,
) -> Result<Loan, PersistedTransitionError>
where
    R: LoanRepository + ?Sized,
{
    let mut loan = repo.load(id)?;
    let loaded_version = loan.version();
    LoanStateMachine::apply(&mut loan, actor, target)?;
    if loan.version() != loaded_version {
        repo.save(&loan, loaded_version)?;
    }
    Ok(loan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rental_core::{ItemId, UserId};
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryRepo {
        loans: RefCell<HashMap<LoanId, Loan>>,
        // Simulates a competing writer landing between load and save.
        interfere: RefCell<bool>,
    }

    impl LoanRepository for MemoryRepo {
        fn load(&self, id: &LoanId) -> Result<Loan, RepositoryError> {
            self.loans
                .borrow()
                .get(id)
                .cloned()
                .ok_or(RepositoryError::NotFound(*id))
        }

        fn save(&self, loan: &Loan, expected_version: u64) -> Result<(), RepositoryError> {
            let mut loans = self.loans.borrow_mut();
            let actual = loans
                .get(&loan.id)
                .map(Loan::version)
                .ok_or(RepositoryError::NotFound(loan.id))?;
            let actual = if *self.interfere.borrow() { actual + 1 } else { actual };
            if actual != expected_version {
                return Err(RepositoryError::Conflict {
                    loan_id: loan.id,
                    expected_version,
                    actual_version: actual,
                });
            }
            loans.insert(loan.id, loan.clone());
            Ok(())
        }
    }

    fn seeded() -> (MemoryRepo, LoanId) {
        let repo = MemoryRepo::default();
        let loan = Loan::inquire(ItemId::new(), UserId::new(), UserId::new());
        let id = loan.id;
        repo.loans.borrow_mut().insert(id, loan);
        (repo, id)
    }

    #[test]
    fn persisted_transition_saves_new_state() {
        let (repo, id) = seeded();
        let loan = transition_persisted(&repo, &id, ActorRole::Owner, LoanStatus::Accepted).unwrap();
        assert_eq!(loan.status(), LoanStatus::Accepted);
        assert_eq!(repo.load(&id).unwrap().status(), LoanStatus::Accepted);
    }

    #[test]
    fn unknown_loan_is_not_found() {
        let (repo, _) = seeded();
        let missing = LoanId::new();
        assert_eq!(
            transition_persisted(&repo, &missing, ActorRole::Owner, LoanStatus::Accepted),
            Err(PersistedTransitionError::NotFound(missing))
        );
    }

    #[test]
    fn save_conflict_maps_to_concurrent_modification() {
        let (repo, id) = seeded();
        *repo.interfere.borrow_mut() = true;
        let err = transition_persisted(&repo, &id, ActorRole::Owner, LoanStatus::Accepted)
            .unwrap_err();
        match err {
            PersistedTransitionError::Transition(TransitionError::ConcurrentModification {
                expected_version,
                actual_version,
                ..
            }) => {
                assert_eq!(expected_version, 0);
                assert_eq!(actual_version, 1);
            }
            other => panic!("expected ConcurrentModification, got {other:?}"),
        }
        assert_eq!(repo.load(&id).unwrap().status(), LoanStatus::Inquired);
    }

    #[test]
    fn rejected_transition_is_not_saved() {
        let (repo, id) = seeded();
        let err = transition_persisted(&repo, &id, ActorRole::Tenant, LoanStatus::Active)
            .unwrap_err();
        assert!(matches!(
            err,
            PersistedTransitionError::Transition(TransitionError::Rejected { .. })
        ));
        assert_eq!(repo.load(&id).unwrap().version(), 0);
    }
}
