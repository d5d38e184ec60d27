//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from rental-state and rental-core to HTTP status
//! codes and a JSON body carrying a machine-readable code and a message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rental_state::{
    PersistedTransitionError, ProtocolError, RejectionReason, RepositoryError, TransitionError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "NOT_FOUND", "TRANSITION_REJECTED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request body malformed or failing business validation (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but not allowed to act on this loan (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The loan changed under the caller (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The state machine refused the transition for this actor (422).
    #[error("{0}")]
    TransitionRejected(String),

    /// The transition is allowed but a protocol is missing (422).
    #[error("{0}")]
    PreconditionUnsatisfied(String),

    /// A capability gate is closed in the loan's current state (422).
    #[error("{0}")]
    ActionNotAllowed(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::TransitionRejected(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                RejectionReason::NotPermitted.as_str(),
            ),
            Self::PreconditionUnsatisfied(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                RejectionReason::PreconditionNotMet.as_str(),
            ),
            Self::ActionNotAllowed(_) => (StatusCode::UNPROCESSABLE_ENTITY, "ACTION_NOT_ALLOWED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<rental_core::ValidationError> for AppError {
    fn from(err: rental_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err.reason() {
            RejectionReason::NotPermitted => Self::TransitionRejected(err.to_string()),
            RejectionReason::PreconditionNotMet => Self::PreconditionUnsatisfied(err.to_string()),
            RejectionReason::ConcurrentModification => Self::Conflict(err.to_string()),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => Self::NotFound(err.to_string()),
            RepositoryError::Conflict { .. } => Self::Conflict(err.to_string()),
        }
    }
}

impl From<PersistedTransitionError> for AppError {
    fn from(err: PersistedTransitionError) -> Self {
        match err {
            PersistedTransitionError::NotFound(_) => Self::NotFound(err.to_string()),
            PersistedTransitionError::Transition(inner) => inner.into(),
        }
    }
}

impl From<ProtocolError> for AppError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::NotAllowed { .. } => Self::ActionNotAllowed(err.to_string()),
            ProtocolError::AlreadyAttached { .. } => Self::Conflict(err.to_string()),
            ProtocolError::Missing { .. } => Self::NotFound(err.to_string()),
        }
    }
}
