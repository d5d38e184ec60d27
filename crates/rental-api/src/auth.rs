//! # Authentication Middleware
//!
//! Resolves who the caller is. Whether the caller is the owner or the
//! tenant of a particular loan is decided per request by
//! [`CallerIdentity::role_in`].
//!
//! ## Token Format
//!
//! ```text
//! Bearer {user_uuid}:{secret}   — required when AUTH_TOKEN is set
//! Bearer {user_uuid}            — accepted in development mode only
//! ```

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rental_core::UserId;
use rental_state::{ActorRole, Loan};
use subtle::ConstantTimeEq;

use crate::error::{AppError, ErrorBody, ErrorDetail};

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// The authenticated user behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: UserId,
}

impl CallerIdentity {
    /// The caller's role in `loan`. Users who are neither party get 403.
    pub fn role_in(&self, loan: &Loan) -> Result<ActorRole, AppError> {
        loan.party_role(&self.user_id).ok_or_else(|| {
            AppError::Forbidden(format!("{} is not a party to {}", self.user_id, loan.id))
        })
    }

    /// Like [`role_in`](Self::role_in), but the caller must be the owner.
    pub fn require_owner(&self, loan: &Loan) -> Result<(), AppError> {
        match self.role_in(loan)? {
            ActorRole::Owner => Ok(()),
            ActorRole::Tenant => Err(AppError::Forbidden(format!(
                "only the owner may do this on {}",
                loan.id
            ))),
        }
    }
}

impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the token value.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of shared secrets.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token into a caller identity.
///
/// With `expected_secret` set, the token must be `{user_uuid}:{secret}`.
/// Without it, the secret part is optional and ignored.
pub fn parse_bearer_token(
    provided: &str,
    expected_secret: Option<&str>,
) -> Result<CallerIdentity, String> {
    let (user, secret) = match provided.split_once(':') {
        Some((user, secret)) => (user, Some(secret)),
        None => (provided, None),
    };

    if let Some(expected) = expected_secret {
        match secret {
            Some(secret) if constant_time_token_eq(secret, expected) => {}
            Some(_) => return Err("invalid bearer token".into()),
            None => return Err("expected {user_id}:{secret}".into()),
        }
    }

    let user_id = user
        .parse::<UserId>()
        .map_err(|e| format!("invalid user id: {e}"))?;
    Ok(CallerIdentity { user_id })
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Validate the bearer token and inject [`CallerIdentity`] into the request.
///
/// Every request needs a token, since the caller's user id is what decides
/// their role in a loan. Development mode only relaxes the secret.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|c| c.token.clone());

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(provided) => match parse_bearer_token(provided.trim(), expected.as_deref()) {
                Ok(identity) => {
                    request.extensions_mut().insert(identity);
                    next.run(request).await
                }
                Err(msg) => {
                    tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
                    unauthorized_response(&msg)
                }
            },
            None => {
                tracing::warn!("authentication failed: non-Bearer authorization scheme");
                unauthorized_response("authorization header must use Bearer scheme")
            }
        },
        None => {
            tracing::warn!("authentication failed: missing authorization header");
            unauthorized_response("missing authorization header")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
