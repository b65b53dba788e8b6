use std::sync::Arc;

use costguard_cloud::executor::ShutdownExecutor;
use costguard_core::target::TargetConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Built once at startup and never mutated; cloning only bumps reference
/// counts.
#[derive(Clone)]
pub struct AppState {
    /// Owns the process-wide control-plane client.
    pub executor: Arc<ShutdownExecutor>,
    /// Instance to stop when a budget is exceeded.
    pub target: Arc<TargetConfig>,
}
