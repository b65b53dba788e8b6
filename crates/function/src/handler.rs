//! One budget event, end to end: decode, evaluate, execute, report.
//!
//! Every path ends here without propagating an error. The caller
//! acknowledges the delivery whatever the outcome; retries are left to
//! the messaging system's redelivery.

use costguard_cloud::executor::ShutdownExecutor;
use costguard_core::notification::BudgetNotification;
use costguard_core::outcome::StopOutcome;
use costguard_core::target::TargetConfig;
use costguard_core::threshold::{evaluate, Evaluation};
use tracing::Instrument;
use uuid::Uuid;

use crate::pubsub::{EnvelopeError, PushEnvelope};

/// Namespace for stop request ids derived from Pub/Sub message ids.
const REQUEST_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f0e_42c1_8b1d_4d55_9a0c_51b7_c0a3_e2f4);

/// What happened to a single delivery.
#[derive(Debug)]
pub enum Invocation {
    /// No usable budget data could be decoded; nothing was evaluated.
    Ignored(EnvelopeError),
    Completed {
        evaluation: Evaluation,
        outcome: StopOutcome,
    },
}

impl Invocation {
    pub fn outcome(&self) -> Option<&StopOutcome> {
        match self {
            Invocation::Ignored(_) => None,
            Invocation::Completed { outcome, .. } => Some(outcome),
        }
    }
}

/// Handle a raw push request body.
pub async fn handle_push(
    executor: &ShutdownExecutor,
    target: &TargetConfig,
    body: &[u8],
) -> Invocation {
    let envelope = match PushEnvelope::from_slice(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring request without a push envelope");
            return Invocation::Ignored(e);
        }
    };

    let message = &envelope.message;
    let span = tracing::info_span!(
        "budget_event",
        message_id = message.message_id.as_deref().unwrap_or("-"),
        budget_id = message.attribute("budgetId").unwrap_or("-"),
        billing_account = message.attribute("billingAccountId").unwrap_or("-"),
        schema_version = message.attribute("schemaVersion").unwrap_or("-"),
        published_at = ?message.published_at(),
    );

    async {
        let notification = match envelope.notification() {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring budget event without usable data");
                return Invocation::Ignored(e);
            }
        };

        let request_id = stop_request_id(&envelope);
        handle_notification(executor, target, &notification, request_id.as_deref()).await
    }
    .instrument(span)
    .await
}

/// Evaluate a decoded notification and act on it.
pub async fn handle_notification(
    executor: &ShutdownExecutor,
    target: &TargetConfig,
    notification: &BudgetNotification,
    request_id: Option<&str>,
) -> Invocation {
    let evaluation = evaluate(notification);

    tracing::info!(
        budget = notification.budget_display_name.as_deref().unwrap_or("-"),
        cost_amount = notification.cost_amount.unwrap_or(0.0),
        budget_amount = notification.budget_amount.unwrap_or(0.0),
        currency = notification.currency_code.as_deref().unwrap_or("-"),
        period_start = ?notification.billing_period_start(),
        alert_threshold_exceeded = ?notification.alert_threshold_exceeded,
        ratio = %format_ratio(&evaluation),
        source = evaluation.source().map_or("-", |s| s.as_str()),
        "Budget status",
    );

    let outcome = executor
        .execute_with_request_id(&evaluation, target, request_id)
        .await;
    report(&evaluation, &outcome, target);

    Invocation::Completed {
        evaluation,
        outcome,
    }
}

/// Idempotency key for the stop request: stable across redeliveries of
/// the same message, distinct between messages.
pub fn stop_request_id(envelope: &PushEnvelope) -> Option<String> {
    let message_id = envelope.message.message_id.as_deref()?;
    let name = format!(
        "{}/{}",
        envelope.subscription.as_deref().unwrap_or_default(),
        message_id
    );
    Some(Uuid::new_v5(&REQUEST_ID_NAMESPACE, name.as_bytes()).to_string())
}

/// Emit the single outcome line for an invocation at the level its
/// outcome class calls for.
fn report(evaluation: &Evaluation, outcome: &StopOutcome, target: &TargetConfig) {
    let ratio = format_ratio(evaluation);
    let incident = outcome.is_incident();

    match outcome {
        StopOutcome::Stopped(status) => tracing::info!(
            %ratio,
            outcome = outcome.label(),
            operation = status.operation.as_deref().unwrap_or("-"),
            operation_status = %status.status,
            "Stop request sent",
        ),
        StopOutcome::SkippedNotExceeded => tracing::info!(
            %ratio,
            outcome = outcome.label(),
            "Budget is within safe limits",
        ),
        StopOutcome::SkippedUndecidable => tracing::warn!(
            outcome = outcome.label(),
            "Budget amount is zero or missing, cannot calculate threshold",
        ),
        StopOutcome::SkippedNoTarget => {
            let reason = target
                .resolve()
                .err()
                .map(|e| e.to_string())
                .unwrap_or_default();
            tracing::error!(
                %ratio,
                outcome = outcome.label(),
                incident,
                %reason,
                "Budget exceeded but stop target is not configured, skipping shutdown",
            );
        }
        StopOutcome::Failed(detail) if detail.kind.is_benign() => tracing::warn!(
            %ratio,
            outcome = outcome.label(),
            kind = detail.kind.as_str(),
            incident,
            error = %detail.message,
            "Instance is already stopping or stopped",
        ),
        StopOutcome::Failed(detail) => tracing::error!(
            %ratio,
            outcome = outcome.label(),
            kind = detail.kind.as_str(),
            incident,
            error = %detail.message,
            "Failed to stop instance",
        ),
    }
}

fn format_ratio(evaluation: &Evaluation) -> String {
    match evaluation.ratio() {
        Some(ratio) => format!("{ratio:.2}"),
        None => "undecidable".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
