//! The compute control-plane seam.

use async_trait::async_trait;
use costguard_core::outcome::{FailureKind, OperationStatus};
use costguard_core::target::ResourceTarget;

use crate::token::TokenError;

/// A control plane able to stop a single compute instance.
///
/// Implementations issue exactly one stop request per call and never
/// retry. `request_id` is an idempotency key the control plane may use to
/// discard repeats of the same request.
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    async fn stop_instance(
        &self,
        target: &ResourceTarget,
        request_id: Option<&str>,
    ) -> Result<OperationStatus, ComputeError>;
}

/// Errors from the control-plane layer.
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The control plane returned a non-2xx status code.
    #[error("Compute API error ({status}): {message}")]
    Api {
        status: u16,
        /// Machine-readable reason (e.g. `notFound`, `resourceNotReady`).
        reason: Option<String>,
        message: String,
    },

    #[error("Failed to obtain access token: {0}")]
    Token(#[from] TokenError),
}

/// Reasons the control plane uses when an instance is not in a state
/// that accepts a stop.
const NOT_READY_REASONS: &[&str] = &["resourceNotReady"];

/// Message fragments meaning the instance is already on its way down.
const ALREADY_STOPPED_PHRASES: &[&str] = &[
    "already stopped",
    "already stopping",
    "already been stopped",
    "is stopping",
    "terminated",
];

impl ComputeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ComputeError::Request(_) => FailureKind::Transport,
            ComputeError::Token(_) => FailureKind::Token,
            ComputeError::Api {
                status,
                reason,
                message,
            } => classify_api_error(*status, reason.as_deref(), message),
        }
    }
}

fn classify_api_error(status: u16, reason: Option<&str>, message: &str) -> FailureKind {
    match status {
        401 | 403 => FailureKind::PermissionDenied,
        404 => FailureKind::NotFound,
        400 | 409 | 412 if is_already_stopped(reason, message) => FailureKind::AlreadyStopped,
        _ => FailureKind::Api,
    }
}

fn is_already_stopped(reason: Option<&str>, message: &str) -> bool {
    if reason.is_some_and(|r| NOT_READY_REASONS.contains(&r)) {
        return true;
    }
    let message = message.to_ascii_lowercase();
    ALREADY_STOPPED_PHRASES.iter().any(|p| message.contains(p))
}
