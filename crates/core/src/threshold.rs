//! Threshold evaluation for budget notifications.
//!
//! Pure logic -- no I/O and no state. Both ratio shapes (a precomputed
//! `alertThresholdExceeded` value or `costAmount / budgetAmount`) are
//! normalised into a single [`ThresholdDecision`].

use crate::notification::BudgetNotification;

/// Spend/budget ratio at which the instance must be stopped (inclusive).
pub const STOP_RATIO: f64 = 1.0;

/// Where the ratio in a [`ThresholdDecision`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioSource {
    /// Taken verbatim from `alertThresholdExceeded`.
    Precomputed,
    /// Derived as `costAmount / budgetAmount`.
    Computed,
}

impl RatioSource {
    pub fn as_str(self) -> &'static str {
        match self {
            RatioSource::Precomputed => "precomputed",
            RatioSource::Computed => "computed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdDecision {
    pub ratio: f64,
    /// `ratio >= STOP_RATIO`. Always false for a NaN ratio.
    pub exceeded: bool,
    pub source: RatioSource,
}

/// Result of evaluating a notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    Decided(ThresholdDecision),
    /// Budget is zero or missing and no precomputed ratio was supplied.
    Undecidable,
}

impl Evaluation {
    /// `true` only for a decided evaluation whose threshold was reached.
    pub fn is_exceeded(&self) -> bool {
        matches!(self, Evaluation::Decided(d) if d.exceeded)
    }

    pub fn ratio(&self) -> Option<f64> {
        match self {
            Evaluation::Decided(d) => Some(d.ratio),
            Evaluation::Undecidable => None,
        }
    }

    pub fn source(&self) -> Option<RatioSource> {
        match self {
            Evaluation::Decided(d) => Some(d.source),
            Evaluation::Undecidable => None,
        }
    }
}

/// Evaluate a notification against [`STOP_RATIO`].
///
/// Missing amounts default to zero. A zero or missing budget without a
/// precomputed ratio is [`Evaluation::Undecidable`], never a decision
/// either way. Malformed (negative or NaN) inputs flow through the
/// comparison unchanged.
pub fn evaluate(notification: &BudgetNotification) -> Evaluation {
    if let Some(ratio) = notification.alert_threshold_exceeded {
        return Evaluation::Decided(decide(ratio, RatioSource::Precomputed));
    }

    let budget = notification.budget_amount.unwrap_or(0.0);
    if budget == 0.0 {
        return Evaluation::Undecidable;
    }

    let cost = notification.cost_amount.unwrap_or(0.0);
    Evaluation::Decided(decide(cost / budget, RatioSource::Computed))
}

fn decide(ratio: f64, source: RatioSource) -> ThresholdDecision {
    ThresholdDecision {
        ratio,
        exceeded: ratio >= STOP_RATIO,
        source,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
