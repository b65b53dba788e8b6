//! `costguard-function` -- stops a compute instance when its budget runs out.
//!
//! Receives budget notifications from a Pub/Sub push subscription on
//! `POST /`, evaluates spend against the budget, and stops the configured
//! instance once spend reaches 100%. See [`FunctionConfig::from_env`] for
//! the environment variables.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use costguard_cloud::executor::ShutdownExecutor;
use costguard_cloud::gce::GceComputeClient;
use costguard_cloud::token::TokenSource;
use costguard_function::app::build_router;
use costguard_function::config::FunctionConfig;
use costguard_function::logging;
use costguard_function::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = FunctionConfig::from_env().context("Invalid configuration")?;

    // --- Tracing ---
    logging::init(config.log_format);

    let missing = config.target.missing_fields();
    if missing.is_empty() {
        tracing::info!(
            project_id = config.target.project_id.as_deref().unwrap_or_default(),
            zone = config.target.zone.as_deref().unwrap_or_default(),
            instance = config.target.instance_name.as_deref().unwrap_or_default(),
            "Loaded stop target",
        );
    } else {
        tracing::warn!(
            ?missing,
            "Stop target incomplete; exceeded budgets will not stop anything",
        );
    }

    // --- Control-plane client (process-wide, built once) ---
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.compute_request_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;
    let tokens = TokenSource::from_parts(
        config.access_token.clone(),
        config.metadata_token_url.clone(),
    );
    let compute = GceComputeClient::with_client(http, config.compute_api_base_url.clone(), tokens);
    tracing::info!(
        base_url = %config.compute_api_base_url,
        static_token = config.access_token.is_some(),
        timeout_secs = config.compute_request_timeout_secs,
        "Compute client ready",
    );

    // --- App state ---
    let state = AppState {
        executor: Arc::new(ShutdownExecutor::new(compute)),
        target: Arc::new(config.target.clone()),
    };

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight invocations");
}
