//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! Loans and protocols live in in-memory stores. The loan store is the
//! [`LoanRepository`] the state machine's persistence helper runs against,
//! so every save is checked against the version the caller loaded.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rental_core::{LoanId, ProtocolId, Timestamp};
use rental_state::{
    ActorRole, Loan, LoanRepository, LoanStateMachine, LoanStatus, ProtocolKind, RepositoryError,
    TransitionError,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// The lock is `parking_lot`, never held across `.await`, and does not
/// poison.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// All records matching `pred`.
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.data.read().values().filter(|v| pred(v)).cloned().collect()
    }

    /// Update a record in place. Returns the updated record, or `None` if not found.
    pub fn update(&self, id: &Uuid, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        guard.get_mut(id).map(|entry| {
            f(entry);
            entry.clone()
        })
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure runs under a single write lock and may refuse the
    /// update by returning `Err`. Returns `None` if the record doesn't
    /// exist.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Remove a record by ID.
    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Loan Store ---------------------------------------------------------------

/// Loans keyed by id, with version-checked saves.
#[derive(Debug, Clone, Default)]
pub struct LoanStore {
    inner: Store<Loan>,
}

impl LoanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly created loan.
    pub fn insert(&self, loan: Loan) {
        self.inner.insert(*loan.id.as_uuid(), loan);
    }

    pub fn get(&self, id: &LoanId) -> Option<Loan> {
        self.inner.get(id.as_uuid())
    }

    /// Loans in which `pred` holds, oldest first.
    pub fn filter(&self, pred: impl Fn(&Loan) -> bool) -> Vec<Loan> {
        let mut loans = self.inner.filter(pred);
        loans.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        loans
    }

    /// Apply a transition under the write lock, requiring `expected_version`.
    pub fn transition_at(
        &self,
        id: &LoanId,
        expected_version: u64,
        actor: ActorRole,
        target: LoanStatus,
    ) -> Option<Result<Loan, TransitionError>> {
        self.inner.try_update(id.as_uuid(), |loan| {
            LoanStateMachine::apply_expecting(loan, expected_version, actor, target).cloned()
        })
    }

    /// Run `f` against the stored loan under the write lock.
    pub fn modify<R, E>(
        &self,
        id: &LoanId,
        f: impl FnOnce(&mut Loan) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.inner.try_update(id.as_uuid(), f)
    }
}

impl LoanRepository for LoanStore {
    fn load(&self, id: &LoanId) -> Result<Loan, RepositoryError> {
        self.get(id).ok_or(RepositoryError::NotFound(*id))
    }

    fn save(&self, loan: &Loan, expected_version: u64) -> Result<(), RepositoryError> {
        self.inner
            .try_update(loan.id.as_uuid(), |stored| {
                if stored.version() != expected_version {
                    return Err(RepositoryError::Conflict {
                        loan_id: loan.id,
                        expected_version,
                        actual_version: stored.version(),
                    });
                }
                *stored = loan.clone();
                Ok(())
            })
            .unwrap_or(Err(RepositoryError::NotFound(loan.id)))
    }
}

// -- Protocol Records ---------------------------------------------------------

/// Content of a pickup or return protocol.
///
/// The state machine only cares that one exists; the content is what the
/// parties look at during the hand-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolRecord {
    pub id: ProtocolId,
    pub loan_id: LoanId,
    pub kind: ProtocolKind,
    pub description: Option<String>,
    /// Deposit the owner accepted, in minor currency units.
    pub accepted_refundable_deposit: Option<u64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// -- Configuration ------------------------------------------------------------

/// Runtime configuration, read once at startup.
///
/// Custom `Debug` redacts the auth token.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared secret for bearer tokens. `None` runs in development mode.
    pub auth_token: Option<String>,
}

impl AppConfig {
    pub const DEFAULT_PORT: u16 = 8080;

    /// Read `PORT` and `AUTH_TOKEN` from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(Self::DEFAULT_PORT);
        let auth_token = lookup("AUTH_TOKEN").filter(|t| !t.is_empty());
        Self { port, auth_token }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub loans: LoanStore,
    pub protocols: Store<ProtocolRecord>,
    pub config: AppConfig,
}

impl AppState {
    /// State with empty stores and development-mode auth.
    pub fn new() -> Self {
        Self::with_config(AppConfig {
            port: AppConfig::DEFAULT_PORT,
            auth_token: None,
        })
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            loans: LoanStore::new(),
            protocols: Store::new(),
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rental_core::{ItemId, UserId};
    use rental_state::transition_persisted;

    fn stored_loan(store: &LoanStore) -> LoanId {
        let loan = Loan::inquire(ItemId::new(), UserId::new(), UserId::new());
        let id = loan.id;
        store.insert(loan);
        id
    }

    #[test]
    fn store_try_update_missing_is_none() {
        let store: Store<u32> = Store::new();
        assert!(store
            .try_update(&Uuid::new_v4(), |v| Ok::<_, ()>(*v))
            .is_none());
    }

    #[test]
    fn store_update_and_filter() {
        let store: Store<u32> = Store::new();
        let a = Uuid::new_v4();
        store.insert(a, 1);
        store.insert(Uuid::new_v4(), 2);
        assert_eq!(store.update(&a, |v| *v += 10), Some(11));
        assert_eq!(store.filter(|v| *v > 5), vec![11]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn save_rejects_stale_version() {
        let store = LoanStore::new();
        let id = stored_loan(&store);
        let mut stale = store.load(&id).unwrap();

        transition_persisted(&store, &id, ActorRole::Owner, LoanStatus::Accepted).unwrap();

        LoanStateMachine::apply(&mut stale, ActorRole::Owner, LoanStatus::Denied).unwrap();
        let err = store.save(&stale, 0).unwrap_err();
        assert_eq!(
            err,
            RepositoryError::Conflict {
                loan_id: id,
                expected_version: 0,
                actual_version: 1,
            }
        );
        assert_eq!(store.get(&id).unwrap().status(), LoanStatus::Accepted);
    }

    #[test]
    fn save_unknown_loan_is_not_found() {
        let store = LoanStore::new();
        let loan = Loan::inquire(ItemId::new(), UserId::new(), UserId::new());
        assert_eq!(store.save(&loan, 0), Err(RepositoryError::NotFound(loan.id)));
    }

    #[test]
    fn transition_at_checks_version_under_lock() {
        let store = LoanStore::new();
        let id = stored_loan(&store);
        let err = store
            .transition_at(&id, 3, ActorRole::Owner, LoanStatus::Accepted)
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, TransitionError::ConcurrentModification { .. }));

        let loan = store
            .transition_at(&id, 0, ActorRole::Owner, LoanStatus::Accepted)
            .unwrap()
            .unwrap();
        assert_eq!(loan.status(), LoanStatus::Accepted);
        assert!(store
            .transition_at(&LoanId::new(), 0, ActorRole::Owner, LoanStatus::Accepted)
            .is_none());
    }

    #[test]
    fn config_defaults_and_overrides() {
        let cfg = AppConfig::from_lookup(|_| None);
        assert_eq!(cfg.port, 8080);
        assert!(cfg.auth_token.is_none());

        let cfg = AppConfig::from_lookup(|k| match k {
            "PORT" => Some("9090".into()),
            "AUTH_TOKEN" => Some("s3cret".into()),
            _ => None,
        });
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.auth_token.as_deref(), Some("s3cret"));
        assert!(!format!("{cfg:?}").contains("s3cret"));
    }

    #[test]
    fn config_ignores_unparseable_port_and_empty_token() {
        let cfg = AppConfig::from_lookup(|k| match k {
            "PORT" => Some("eighty".into()),
            "AUTH_TOKEN" => Some(String::new()),
            _ => None,
        });
        assert_eq!(cfg.port, 8080);
        assert!(cfg.auth_token.is_none());
    }
}
