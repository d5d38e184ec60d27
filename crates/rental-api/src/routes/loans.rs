//! # Loan Routes
//!
//! Inquiry, lookup, and status transitions. Every transition goes through
//! the loan state machine; this module only resolves the caller's role
//! and maps the outcome to HTTP.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use rental_core::{ItemId, LoanId, UserId};
use rental_state::{
    transition_persisted, ActorRole, Capabilities, CapabilityQuery, Loan, LoanRepository,
    LoanStateMachine, LoanStatus, PersistedTransitionError,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PaginationParams;
use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Request to borrow an item.
#[derive(Debug, Deserialize)]
pub struct CreateLoanRequest {
    pub item_id: ItemId,
    pub owner_id: UserId,
}

impl Validate for CreateLoanRequest {
    fn validate(&self) -> Result<(), String> {
        if self.item_id.as_uuid().is_nil() {
            return Err("item_id must not be the nil UUID".to_string());
        }
        if self.owner_id.as_uuid().is_nil() {
            return Err("owner_id must not be the nil UUID".to_string());
        }
        Ok(())
    }
}

/// Request to move a loan to another status.
#[derive(Debug, Deserialize)]
pub struct TransitionLoanRequest {
    /// Target status, e.g. `ACCEPTED` or `prepared-for-pickup`.
    pub status: String,
    /// Version the caller last saw. When present, the update is refused if
    /// the loan has changed since.
    pub version: Option<u64>,
}

impl Validate for TransitionLoanRequest {
    fn validate(&self) -> Result<(), String> {
        if self.status.trim().is_empty() {
            return Err("status must not be empty".to_string());
        }
        Ok(())
    }
}

/// Capability flags plus what the caller can do next.
#[derive(Debug, Serialize, Deserialize)]
pub struct CapabilitiesResponse {
    pub loan_id: LoanId,
    pub role: ActorRole,
    pub version: u64,
    /// Targets the caller could move the loan to right now, self included.
    pub allowed_targets: Vec<LoanStatus>,
    #[serde(flatten)]
    pub capabilities: Capabilities,
}

/// Build the loans router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/loans", get(list_loans).post(create_loan))
        .route("/v1/loans/{id}", get(get_loan).put(transition_loan))
        .route("/v1/loans/{id}/capabilities", get(get_capabilities))
}

/// Load a loan and resolve the caller's role in it.
pub(crate) fn load_as_party(
    state: &AppState,
    caller: &CallerIdentity,
    id: Uuid,
) -> Result<(Loan, ActorRole), AppError> {
    let loan = state.loans.load(&LoanId::from_uuid(id))?;
    let role = caller.role_in(&loan)?;
    Ok((loan, role))
}

/// POST /v1/loans — Inquire about borrowing an item. The caller is the tenant.
async fn create_loan(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateLoanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Loan>), AppError> {
    let req = extract_validated_json(body)?;
    if req.owner_id == caller.user_id {
        return Err(AppError::Validation(
            "cannot inquire about your own item".to_string(),
        ));
    }

    let loan = Loan::inquire(req.item_id, caller.user_id, req.owner_id);
    state.loans.insert(loan.clone());
    tracing::info!(
        loan_id = %loan.id,
        item_id = %loan.item_id,
        tenant_id = %loan.tenant_id,
        owner_id = %loan.owner_id,
        "loan inquired"
    );

    Ok((StatusCode::CREATED, Json(loan)))
}

/// GET /v1/loans — Loans the caller is a party to, oldest first.
async fn list_loans(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(pagination): Query<PaginationParams>,
) -> Json<Vec<Loan>> {
    let mine = state
        .loans
        .filter(|loan| loan.party_role(&caller.user_id).is_some());
    Json(pagination.apply(mine))
}

/// GET /v1/loans/{id}
async fn get_loan(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Loan>, AppError> {
    let (loan, _) = load_as_party(&state, &caller, id)?;
    Ok(Json(loan))
}

/// PUT /v1/loans/{id} — Move the loan to another status.
async fn transition_loan(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<TransitionLoanRequest>, JsonRejection>,
) -> Result<Json<Loan>, AppError> {
    let req = extract_validated_json(body)?;
    let target: LoanStatus = req.status.parse()?;
    let (loan, role) = load_as_party(&state, &caller, id)?;
    let from = loan.status();

    let result = match req.version {
        Some(expected) => match state.loans.transition_at(&loan.id, expected, role, target) {
            Some(result) => result.map_err(PersistedTransitionError::from),
            None => Err(PersistedTransitionError::NotFound(loan.id)),
        },
        None => transition_persisted(&state.loans, &loan.id, role, target),
    };

    match result {
        Ok(updated) => {
            if from != target {
                tracing::info!(
                    loan_id = %updated.id,
                    from = %from,
                    to = %target,
                    actor = %role,
                    version = updated.version(),
                    "loan transitioned"
                );
            }
            Ok(Json(updated))
        }
        Err(err) => {
            if let PersistedTransitionError::Transition(inner) = &err {
                tracing::warn!(
                    loan_id = %loan.id,
                    from = %from,
                    to = %target,
                    actor = %role,
                    reason = %inner.reason(),
                    "loan transition refused"
                );
            }
            Err(err.into())
        }
    }
}

/// GET /v1/loans/{id}/capabilities
async fn get_capabilities(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<CapabilitiesResponse>, AppError> {
    let (loan, role) = load_as_party(&state, &caller, id)?;
    let facts = loan.facts();
    let allowed_targets = LoanStatus::ALL
        .into_iter()
        .filter(|target| LoanStateMachine::decide(loan.status(), &facts, role, *target).is_ok())
        .collect();

    Ok(Json(CapabilitiesResponse {
        loan_id: loan.id,
        role,
        version: loan.version(),
        allowed_targets,
        capabilities: CapabilityQuery::snapshot(loan.status()),
    }))
}
