//! Budget notification payload and its decoder.
//!
//! Budget notifications arrive as JSON objects with camelCase keys. Only
//! `costAmount`, `budgetAmount` and `alertThresholdExceeded` drive the
//! shutdown decision; the remaining fields are carried for log context.
//!
//! Decoding is deliberately lenient about numeric fields: `null` counts
//! as absent, numeric strings are parsed, and any other non-numeric value
//! becomes `NaN` so it flows through the threshold comparison instead of
//! failing the whole payload.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::Timestamp;

/// A decoded budget notification.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetNotification {
    /// Spend so far in the current billing period.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub cost_amount: Option<f64>,
    /// Allotted budget for the period.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub budget_amount: Option<f64>,
    /// Precomputed spend/budget ratio of the threshold that was crossed.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub alert_threshold_exceeded: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub forecast_threshold_exceeded: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub budget_display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub currency_code: Option<String>,
    /// RFC 3339 start of the billing period this notification reports on.
    #[serde(default, deserialize_with = "lenient_text")]
    pub cost_interval_start: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub budget_amount_type: Option<String>,
}

/// Reasons a payload carries no usable budget data.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Payload is empty")]
    Empty,

    #[error("Payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Payload is not a JSON object")]
    NotAnObject,

    #[error("Payload has none of costAmount, budgetAmount or alertThresholdExceeded")]
    NoUsableData,
}

impl BudgetNotification {
    /// Decode a notification from raw JSON bytes.
    ///
    /// An object without any of the three decision fields (including `{}`)
    /// is rejected with [`DecodeError::NoUsableData`].
    pub fn from_json(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(DecodeError::Empty);
        }

        let value: Value = serde_json::from_slice(bytes)?;
        if !value.is_object() {
            return Err(DecodeError::NotAnObject);
        }

        let notification: Self = serde_json::from_value(value)?;
        if !notification.has_usable_data() {
            return Err(DecodeError::NoUsableData);
        }
        Ok(notification)
    }

    /// Whether any field that feeds the threshold decision is present.
    pub fn has_usable_data(&self) -> bool {
        self.cost_amount.is_some()
            || self.budget_amount.is_some()
            || self.alert_threshold_exceeded.is_some()
    }

    /// Start of the billing period, if present and well-formed.
    pub fn billing_period_start(&self) -> Option<Timestamp> {
        self.cost_interval_start
            .as_deref()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc))
    }
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(amount_from_value(&value))
}

fn amount_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Number(n) => Some(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().parse().unwrap_or(f64::NAN)),
        _ => Some(f64::NAN),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
