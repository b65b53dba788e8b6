use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether a complete stop target is configured.
    pub target_configured: bool,
}

/// GET /health -- reports liveness and whether a stop target is set.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let target_configured = state.target.is_complete();

    Json(HealthResponse {
        status: if target_configured { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        target_configured,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
