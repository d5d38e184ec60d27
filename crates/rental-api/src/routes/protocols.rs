//! # Protocol Routes
//!
//! Pickup and return protocols document the physical hand-off. Only the
//! owner writes them; both parties may read them. Creation and editing are
//! gated by the loan's capability table, and attaching one bumps the
//! loan's version.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use rental_core::{ProtocolId, Timestamp};
use rental_state::ProtocolKind;
use serde::Deserialize;
use uuid::Uuid;

use super::loans::load_as_party;
use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{AppState, ProtocolRecord};

const MAX_DESCRIPTION_LEN: usize = 4000;

/// Body for creating or editing a protocol.
#[derive(Debug, Deserialize, Default)]
pub struct ProtocolRequest {
    pub description: Option<String>,
    /// Deposit the owner accepted, in minor currency units.
    pub accepted_refundable_deposit: Option<u64>,
}

impl Validate for ProtocolRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(format!(
                    "description must not exceed {MAX_DESCRIPTION_LEN} characters"
                ));
            }
        }
        Ok(())
    }
}

/// Build the protocols router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/loans/{id}/pickup-protocol",
            get(get_pickup).post(create_pickup).put(update_pickup),
        )
        .route(
            "/v1/loans/{id}/return-protocol",
            get(get_return).post(create_return).put(update_return),
        )
}

async fn create_pickup(
    state: State<AppState>,
    caller: CallerIdentity,
    id: Path<Uuid>,
    body: Result<Json<ProtocolRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProtocolRecord>), AppError> {
    create(ProtocolKind::Pickup, state, caller, id, body).await
}

async fn create_return(
    state: State<AppState>,
    caller: CallerIdentity,
    id: Path<Uuid>,
    body: Result<Json<ProtocolRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProtocolRecord>), AppError> {
    create(ProtocolKind::Return, state, caller, id, body).await
}

async fn get_pickup(
    state: State<AppState>,
    caller: CallerIdentity,
    id: Path<Uuid>,
) -> Result<Json<ProtocolRecord>, AppError> {
    fetch(ProtocolKind::Pickup, state, caller, id).await
}

async fn get_return(
    state: State<AppState>,
    caller: CallerIdentity,
    id: Path<Uuid>,
) -> Result<Json<ProtocolRecord>, AppError> {
    fetch(ProtocolKind::Return, state, caller, id).await
}

async fn update_pickup(
    state: State<AppState>,
    caller: CallerIdentity,
    id: Path<Uuid>,
    body: Result<Json<ProtocolRequest>, JsonRejection>,
) -> Result<Json<ProtocolRecord>, AppError> {
    update(ProtocolKind::Pickup, state, caller, id, body).await
}

async fn update_return(
    state: State<AppState>,
    caller: CallerIdentity,
    id: Path<Uuid>,
    body: Result<Json<ProtocolRequest>, JsonRejection>,
) -> Result<Json<ProtocolRecord>, AppError> {
    update(ProtocolKind::Return, state, caller, id, body).await
}

/// POST — attach a new protocol to the loan.
async fn create(
    kind: ProtocolKind,
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<ProtocolRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProtocolRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let (loan, _) = load_as_party(&state, &caller, id)?;
    caller.require_owner(&loan)?;

    let now = Timestamp::now();
    let record = ProtocolRecord {
        id: ProtocolId::new(),
        loan_id: loan.id,
        kind,
        description: req.description,
        accepted_refundable_deposit: req.accepted_refundable_deposit,
        created_at: now,
        updated_at: now,
    };

    // The record goes in first so a reader never sees an attached id
    // without content.
    state.protocols.insert(*record.id.as_uuid(), record.clone());
    let attached = state
        .loans
        .modify(&loan.id, |stored| stored.attach_protocol(kind, record.id))
        .ok_or_else(|| AppError::NotFound(format!("{} not found", loan.id)))
        .and_then(|r| r.map_err(AppError::from));
    if let Err(err) = attached {
        state.protocols.remove(record.id.as_uuid());
        return Err(err);
    }

    tracing::info!(
        loan_id = %loan.id,
        protocol_id = %record.id,
        kind = %kind,
        "protocol attached"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET — read the protocol attached to the loan.
async fn fetch(
    kind: ProtocolKind,
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ProtocolRecord>, AppError> {
    let (loan, _) = load_as_party(&state, &caller, id)?;
    let protocol_id = loan
        .protocol(kind)
        .ok_or_else(|| AppError::NotFound(format!("{} has no {kind} protocol", loan.id)))?;
    state
        .protocols
        .get(protocol_id.as_uuid())
        .map(Json)
        .ok_or_else(|| AppError::Internal(format!("{protocol_id} referenced by {} is missing", loan.id)))
}

/// PUT — edit the attached protocol's content.
async fn update(
    kind: ProtocolKind,
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<ProtocolRequest>, JsonRejection>,
) -> Result<Json<ProtocolRecord>, AppError> {
    let req = extract_validated_json(body)?;
    let (loan, _) = load_as_party(&state, &caller, id)?;
    caller.require_owner(&loan)?;
    let protocol_id = loan.editable_protocol(kind)?;

    let updated = state
        .protocols
        .update(protocol_id.as_uuid(), |record| {
            if req.description.is_some() {
                record.description = req.description;
            }
            if req.accepted_refundable_deposit.is_some() {
                record.accepted_refundable_deposit = req.accepted_refundable_deposit;
            }
            record.updated_at = Timestamp::now();
        })
        .ok_or_else(|| AppError::Internal(format!("{protocol_id} referenced by {} is missing", loan.id)))?;

    tracing::info!(loan_id = %loan.id, protocol_id = %protocol_id, kind = %kind, "protocol updated");
    Ok(Json(updated))
}
