//! Optica storefront library.
//!
//! Server-rendered eyewear shop: catalog browsing with filters, phone-OTP
//! login, member prices, voucher claiming and trade-in requests. The binary
//! only adds process setup on top of [`app`], which keeps the whole router
//! testable in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod gateway;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod trade_in;
pub mod vouchers;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    routing::get,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Directory served under `/static`, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the storefront router with every layer applied.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .with_state(state)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Checks the database when one is configured and that the catalog loads.
/// Returns 503 Service Unavailable otherwise.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if let Some(pool) = state.pool() {
        if let Err(e) = sqlx::query("SELECT 1").fetch_one(pool).await {
            tracing::warn!(error = %e, "Readiness: database unreachable");
            return StatusCode::SERVICE_UNAVAILABLE;
        }
    }
    match state.catalog().products().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness: catalog unavailable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
