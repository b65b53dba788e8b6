//! Shutdown executor: turns an evaluation into at most one stop request.
//!
//! [`ShutdownExecutor`] is built once at process start and owns the
//! control-plane client for the life of the process. It holds no mutable
//! state, so concurrent invocations never interact.

use std::sync::Arc;

use costguard_core::outcome::{FailureDetail, StopOutcome};
use costguard_core::target::TargetConfig;
use costguard_core::threshold::Evaluation;

use crate::provider::ComputeProvider;

pub struct ShutdownExecutor {
    provider: Arc<dyn ComputeProvider>,
}

impl ShutdownExecutor {
    pub fn new<P: ComputeProvider + 'static>(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    pub fn from_shared(provider: Arc<dyn ComputeProvider>) -> Self {
        Self { provider }
    }

    /// Act on an evaluation without an idempotency key.
    pub async fn execute(&self, evaluation: &Evaluation, target: &TargetConfig) -> StopOutcome {
        self.execute_with_request_id(evaluation, target, None).await
    }

    /// Act on an evaluation.
    ///
    /// Only an exceeded decision with a complete, valid target reaches the
    /// control plane, and then with exactly one request. Failures are
    /// returned as [`StopOutcome::Failed`]; nothing is retried here.
    pub async fn execute_with_request_id(
        &self,
        evaluation: &Evaluation,
        target: &TargetConfig,
        request_id: Option<&str>,
    ) -> StopOutcome {
        let decision = match evaluation {
            Evaluation::Undecidable => return StopOutcome::SkippedUndecidable,
            Evaluation::Decided(d) if !d.exceeded => return StopOutcome::SkippedNotExceeded,
            Evaluation::Decided(d) => d,
        };

        // The caller reports the configuration fault.
        let Ok(target) = target.resolve() else {
            return StopOutcome::SkippedNoTarget;
        };

        tracing::info!(
            ratio = decision.ratio,
            target = %target,
            request_id = request_id.unwrap_or("-"),
            "Budget limit reached, stopping instance",
        );

        match self.provider.stop_instance(&target, request_id).await {
            Ok(status) => StopOutcome::Stopped(status),
            Err(e) => StopOutcome::Failed(FailureDetail {
                kind: e.kind(),
                message: e.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
