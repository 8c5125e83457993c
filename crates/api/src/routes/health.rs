//! Liveness endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health — liveness check; the cart server is up if it answers.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
