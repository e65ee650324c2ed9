//! Health check endpoint.
//!
//! Used by load balancers and monitoring systems to verify the process is
//! up. Does not check collaborators.

use axum::http::StatusCode;

/// Liveness check.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}
