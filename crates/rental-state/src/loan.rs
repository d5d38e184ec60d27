//! # Loan Aggregate
//!
//! The loan record under the state machine's authority. Its status,
//! version counter, and transition history are private: the only code
//! path that moves a loan between states is
//! [`LoanStateMachine`](crate::machine::LoanStateMachine), and the only
//! way to obtain a fresh loan is [`Loan::inquire`], which always starts at
//! `INQUIRED`.
//!
//! Protocol attachment lives here rather than in the machine because it
//! does not change the status. It is still gated by the per-state
//! capability table and still bumps the version, so a concurrent status
//! change and protocol attachment cannot both win.

use rental_core::{ItemId, LoanId, ProtocolId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capability::CapabilityQuery;
use crate::guard::LoanFacts;
use crate::status::{ActorRole, LoanStatus};

// ─── Protocols ───────────────────────────────────────────────────────

/// The two hand-off documents a loan can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
    Pickup,
    Return,
}

impl ProtocolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Return => "return",
        }
    }
}

impl std::fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from attaching or editing a loan's protocols.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The capability gate for this action is closed in the current state.
    #[error("cannot {action} {kind} protocol while loan is {status}")]
    NotAllowed {
        kind: ProtocolKind,
        action: &'static str,
        status: LoanStatus,
    },

    /// A protocol of this kind is already attached.
    #[error("{loan_id} already has a {kind} protocol ({existing})")]
    AlreadyAttached {
        loan_id: LoanId,
        kind: ProtocolKind,
        existing: ProtocolId,
    },

    /// No protocol of this kind has been attached yet.
    #[error("{loan_id} has no {kind} protocol")]
    Missing { loan_id: LoanId, kind: ProtocolKind },
}

// ─── Transition Record ───────────────────────────────────────────────

/// Record of one status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTransitionRecord {
    /// Status before the transition.
    pub from: LoanStatus,
    /// Status after the transition.
    pub to: LoanStatus,
    /// Party that requested it.
    pub actor: ActorRole,
    /// When it was applied.
    pub timestamp: Timestamp,
}

// ─── Loan ────────────────────────────────────────────────────────────

/// One item being requested, borrowed, and returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub item_id: ItemId,
    pub tenant_id: UserId,
    pub owner_id: UserId,
    status: LoanStatus,
    pub pickup_protocol: Option<ProtocolId>,
    pub return_protocol: Option<ProtocolId>,
    version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    transitions: Vec<LoanTransitionRecord>,
}

impl Loan {
    /// Open a new inquiry from `tenant` for `owner`'s item.
    pub fn inquire(item_id: ItemId, tenant_id: UserId, owner_id: UserId) -> Self {
        let now = Timestamp::now();
        Self {
            id: LoanId::new(),
            item_id,
            tenant_id,
            owner_id,
            status: LoanStatus::Inquired,
            pickup_protocol: None,
            return_protocol: None,
            version: 0,
            created_at: now,
            updated_at: now,
            transitions: Vec::new(),
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> LoanStatus {
        self.status
    }

    /// Optimistic-concurrency token. Incremented on every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Ordered log of every status change.
    pub fn transitions(&self) -> &[LoanTransitionRecord] {
        &self.transitions
    }

    /// Protocol-existence snapshot for the guard.
    pub fn facts(&self) -> LoanFacts {
        LoanFacts {
            pickup_protocol_present: self.pickup_protocol.is_some(),
            return_protocol_present: self.return_protocol.is_some(),
        }
    }

    /// The role `user` plays in this loan, if any.
    ///
    /// Owner wins if the same user is on both sides, which only happens
    /// for records built outside the API.
    pub fn party_role(&self, user: &UserId) -> Option<ActorRole> {
        if *user == self.owner_id {
            Some(ActorRole::Owner)
        } else if *user == self.tenant_id {
            Some(ActorRole::Tenant)
        } else {
            None
        }
    }

    /// The attached protocol of `kind`, if any.
    pub fn protocol(&self, kind: ProtocolKind) -> Option<ProtocolId> {
        match kind {
            ProtocolKind::Pickup => self.pickup_protocol,
            ProtocolKind::Return => self.return_protocol,
        }
    }

    /// Attach a pickup protocol. Allowed only while the loan is `ACCEPTED`.
    pub fn attach_pickup_protocol(&mut self, id: ProtocolId) -> Result<(), ProtocolError> {
        self.attach_protocol(ProtocolKind::Pickup, id)
    }

    /// Attach a return protocol. Allowed only while the loan is `ACTIVE`.
    pub fn attach_return_protocol(&mut self, id: ProtocolId) -> Result<(), ProtocolError> {
        self.attach_protocol(ProtocolKind::Return, id)
    }

    /// Attach a protocol of `kind`, subject to the create gate.
    pub fn attach_protocol(
        &mut self,
        kind: ProtocolKind,
        id: ProtocolId,
    ) -> Result<(), ProtocolError> {
        let allowed = match kind {
            ProtocolKind::Pickup => CapabilityQuery::can_create_pickup_protocol(self.status),
            ProtocolKind::Return => CapabilityQuery::can_create_return_protocol(self.status),
        };
        if !allowed {
            return Err(ProtocolError::NotAllowed {
                kind,
                action: "create",
                status: self.status,
            });
        }
        if let Some(existing) = self.protocol(kind) {
            return Err(ProtocolError::AlreadyAttached {
                loan_id: self.id,
                kind,
                existing,
            });
        }
        match kind {
            ProtocolKind::Pickup => self.pickup_protocol = Some(id),
            ProtocolKind::Return => self.return_protocol = Some(id),
        }
        self.touch();
        Ok(())
    }

    /// Confirm that the attached protocol of `kind` may be edited now.
    ///
    /// Returns the protocol's id. Editing the protocol's content is the
    /// caller's business; the loan itself is not modified.
    pub fn editable_protocol(&self, kind: ProtocolKind) -> Result<ProtocolId, ProtocolError> {
        let allowed = match kind {
            ProtocolKind::Pickup => CapabilityQuery::can_update_pickup_protocol(self.status),
            ProtocolKind::Return => CapabilityQuery::can_update_return_protocol(self.status),
        };
        if !allowed {
            return Err(ProtocolError::NotAllowed {
                kind,
                action: "update",
                status: self.status,
            });
        }
        self.protocol(kind).ok_or(ProtocolError::Missing {
            loan_id: self.id,
            kind,
        })
    }

    /// Move to `to` and log it. Callers must have run policy and guard.
    pub(crate) fn record_transition(&mut self, to: LoanStatus, actor: ActorRole) {
        let timestamp = Timestamp::now();
        self.transitions.push(LoanTransitionRecord {
            from: self.status,
            to,
            actor,
            timestamp,
        });
        self.status = to;
        self.version += 1;
        self.updated_at = timestamp;
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Timestamp::now();
    }
}
