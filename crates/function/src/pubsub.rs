//! Pub/Sub push envelope decoding.
//!
//! A push subscription POSTs
//! `{"message": {"data": "<base64>", "attributes": {..}, "messageId": "..",
//! "publishTime": ".."}, "subscription": ".."}`. The `data` field holds the
//! budget notification JSON.

use std::collections::HashMap;

use base64::Engine as _;
use costguard_core::notification::{BudgetNotification, DecodeError};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct PushEnvelope {
    pub message: PubsubMessage,
    #[serde(default)]
    pub subscription: Option<String>,
}

/// Push deliveries carry both `messageId` and `message_id`; only the
/// camelCase spelling is read so the duplicate is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubsubMessage {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub publish_time: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Request body is not a push envelope: {0}")]
    InvalidEnvelope(#[source] serde_json::Error),

    #[error("No data received from Pub/Sub")]
    MissingData,

    #[error("Message data is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Invalid budget notification: {0}")]
    Payload(#[from] DecodeError),
}

impl PushEnvelope {
    pub fn from_slice(body: &[u8]) -> Result<Self, EnvelopeError> {
        serde_json::from_slice(body).map_err(EnvelopeError::InvalidEnvelope)
    }

    /// Decode the budget notification carried in `message.data`.
    pub fn notification(&self) -> Result<BudgetNotification, EnvelopeError> {
        let data = self
            .message
            .data
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or(EnvelopeError::MissingData)?;

        let bytes = base64::engine::general_purpose::STANDARD.decode(data)?;
        Ok(BudgetNotification::from_json(&bytes)?)
    }
}

impl PubsubMessage {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn published_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.publish_time
            .as_deref()
            .and_then(|t| chrono::DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&chrono::Utc))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
