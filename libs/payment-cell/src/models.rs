// libs/payment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use consultation_cell::ConsultationError;

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";
pub const CHARGE_SUCCESS_EVENT: &str = "charge.success";

// ==============================================================================
// GATEWAY PAYLOADS
// ==============================================================================

/// Envelope of every gateway delivery. `data` is only interpreted for
/// events we act on.
#[derive(Debug, Clone, Deserialize)]
pub struct PaystackEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChargeData {
    pub reference: String,
    #[serde(default)]
    pub metadata: Value,
}

/// What a paid extension carries in the charge metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionMetadata {
    #[serde(alias = "room_name")]
    pub room_name: String,
    #[serde(alias = "minutes_to_extend", deserialize_with = "number_or_numeric_string")]
    pub minutes_to_extend: i64,
}

impl ExtensionMetadata {
    /// Metadata arrives either as an object or as a JSON-encoded string.
    pub fn from_value(value: &Value) -> Result<Self, PaymentWebhookError> {
        let parsed = match value {
            Value::String(encoded) => serde_json::from_str(encoded),
            other => serde_json::from_value(other.clone()),
        };
        parsed.map_err(|e| PaymentWebhookError::InvalidMetadata(e.to_string()))
    }
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(i64),
        Text(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("not a whole number: {:?}", s))),
    }
}

// ==============================================================================
// OUTCOMES & ERRORS
// ==============================================================================

/// What happened to an authenticated delivery. Every variant is acknowledged.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Extended {
        reference: String,
        room_name: String,
        new_end_at: DateTime<Utc>,
    },
    AlreadyApplied {
        reference: String,
    },
    Ignored {
        event: String,
    },
    Failed {
        reference: Option<String>,
        reason: String,
    },
}

/// Failures that reject a delivery outright. Downstream problems become
/// [`WebhookOutcome::Failed`] instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaymentWebhookError {
    #[error("payment webhook not configured")]
    NotConfigured,

    #[error("Missing signature")]
    MissingSignature,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid extension metadata: {0}")]
    InvalidMetadata(String),

    #[error("Extension failed: {0}")]
    Extension(#[from] ConsultationError),
}
