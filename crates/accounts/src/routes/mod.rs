//! HTTP route handlers for the accounts service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health          - Liveness check
//! GET  /health/ready    - Readiness check (directory reachable)
//! POST /api/accounts    - Provision an account and send an OTP
//! ```

pub mod accounts;

use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{account_rate_limiter, request_id_middleware};
use crate::state::AppState;

/// Create the account API router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/api/accounts", post(accounts::create))
        .layer(account_rate_limiter())
}

/// Create all routes for the accounts service.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(account_routes())
}

/// Build the full application with tracing and request IDs.
///
/// Sentry layers are added by the binary, outside this router.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the directory does not answer.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.directory().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "directory not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use secrecy::SecretString;
    use stashbox_core::Avatar;
    use tower::ServiceExt;

    use super::*;
    use crate::appwrite::AppwriteClient;
    use crate::config::AppwriteConfig;
    use crate::directory::InMemoryDirectory;
    use crate::middleware::REQUEST_ID_HEADER;
    use crate::otp::AppwriteOtpIssuer;

    fn test_app() -> Router {
        // Nothing here reaches the issuer
        let config = AppwriteConfig::for_endpoint(
            "http://127.0.0.1:9/v1",
            SecretString::from("test-api-key"),
        );
        let issuer = AppwriteOtpIssuer::new(AppwriteClient::new(&config).unwrap());
        app(AppState::new(
            Arc::new(InMemoryDirectory::new()),
            Arc::new(issuer),
            Avatar::default(),
        ))
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_readiness_with_memory_directory() {
        let response = test_app()
            .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let response = test_app()
            .oneshot(
                Request::get("/health")
                    .header(REQUEST_ID_HEADER, "req-abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-abc");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let response = test_app()
            .oneshot(
                Request::post("/api/accounts")
                    .header("content-type", "application/json")
                    .header("x-forwarded-for", "203.0.113.7")
                    .body(Body::from("{\"email\": 42}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
