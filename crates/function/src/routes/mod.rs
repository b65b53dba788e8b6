use axum::Router;

use crate::state::AppState;

pub mod events;
pub mod health;

/// All routes of the function, mounted at the root.
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(events::router())
}
