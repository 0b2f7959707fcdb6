// libs/payment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{PaymentWebhookError, SIGNATURE_HEADER};
use crate::services::PaystackWebhookService;

impl From<PaymentWebhookError> for AppError {
    fn from(err: PaymentWebhookError) -> Self {
        match err {
            PaymentWebhookError::NotConfigured => AppError::Internal(err.to_string()),
            PaymentWebhookError::MissingSignature | PaymentWebhookError::InvalidSignature => {
                AppError::Auth("Invalid signature".to_string())
            }
            PaymentWebhookError::InvalidPayload(_) | PaymentWebhookError::InvalidMetadata(_) => {
                AppError::BadRequest(err.to_string())
            }
            PaymentWebhookError::Extension(inner) => inner.into(),
        }
    }
}

/// Gateway delivery endpoint. The raw body is needed for signature checks.
pub async fn paystack_webhook(
    State(service): State<Arc<PaystackWebhookService>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    service.handle_delivery(&body, signature).await?;

    Ok(Json(json!({ "received": true })))
}
