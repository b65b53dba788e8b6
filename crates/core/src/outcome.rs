//! Outcome of a single shutdown invocation.

use serde::Serialize;

/// Status of the stop operation as reported by the control plane.
///
/// The operation is not polled; `status` is whatever the control plane
/// returned when it accepted the request (e.g. `PENDING`, `RUNNING`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationStatus {
    /// Control-plane operation identifier, when one was returned.
    pub operation: Option<String>,
    pub status: String,
}

/// Classification of a failed stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The instance is already stopping or stopped. Expected on redelivery.
    AlreadyStopped,
    NotFound,
    PermissionDenied,
    /// Network, DNS, TLS or timeout failure before a response arrived.
    Transport,
    /// No access token could be obtained for the request.
    Token,
    /// Any other error response from the control plane.
    Api,
}

impl FailureKind {
    /// Benign failures are logged but never raised as incidents.
    pub fn is_benign(self) -> bool {
        matches!(self, FailureKind::AlreadyStopped)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::AlreadyStopped => "already_stopped",
            FailureKind::NotFound => "not_found",
            FailureKind::PermissionDenied => "permission_denied",
            FailureKind::Transport => "transport",
            FailureKind::Token => "token",
            FailureKind::Api => "api",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDetail {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped(OperationStatus),
    /// Exceeded, but the target configuration is incomplete or invalid.
    SkippedNoTarget,
    SkippedNotExceeded,
    SkippedUndecidable,
    Failed(FailureDetail),
}

impl StopOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            StopOutcome::Stopped(_) => "stopped",
            StopOutcome::SkippedNoTarget => "skipped_no_target",
            StopOutcome::SkippedNotExceeded => "skipped_not_exceeded",
            StopOutcome::SkippedUndecidable => "skipped_undecidable",
            StopOutcome::Failed(_) => "failed",
        }
    }

    /// Whether an operator has to act: a deployment defect or a
    /// non-benign control-plane failure.
    pub fn is_incident(&self) -> bool {
        match self {
            StopOutcome::SkippedNoTarget => true,
            StopOutcome::Failed(detail) => !detail.kind.is_benign(),
            _ => false,
        }
    }
}
