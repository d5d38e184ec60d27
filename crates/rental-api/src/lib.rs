//! # rental-api — HTTP Adapter for the Loan Lifecycle
//!
//! Resolves who is calling, whether they are the owner or the tenant of
//! the loan they address, and hands the request to the state machine in
//! `rental-state`. Loans and protocols are kept in memory.
//!
//! ## API Surface
//!
//! | Route                                   | Module                 |
//! |-----------------------------------------|------------------------|
//! | `/v1/loans`, `/v1/loans/{id}`           | [`routes::loans`]      |
//! | `/v1/loans/{id}/capabilities`           | [`routes::loans`]      |
//! | `/v1/loans/{id}/pickup-protocol`        | [`routes::protocols`]  |
//! | `/v1/loans/{id}/return-protocol`        | [`routes::protocols`]  |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::loans::router())
        .merge(routes::protocols::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe. 200 while the process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. The in-memory stores need no warm-up.
async fn readiness() -> &'static str {
    "ready"
}
