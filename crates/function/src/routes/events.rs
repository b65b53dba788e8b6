//! Push endpoint for budget notifications.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::post, Router};

use crate::handler;
use crate::state::AppState;

/// POST / -- one Pub/Sub push delivery.
///
/// Acknowledges with `204 No Content` once the invocation has run to
/// completion, whatever its outcome. Every outcome is terminal.
async fn receive(State(state): State<AppState>, body: Bytes) -> StatusCode {
    handler::handle_push(&state.executor, &state.target, &body).await;
    StatusCode::NO_CONTENT
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(receive))
}
