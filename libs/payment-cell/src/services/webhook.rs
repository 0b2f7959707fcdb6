// libs/payment-cell/src/services/webhook.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use consultation_cell::ConsultationService;
use shared_config::{AppConfig, DEFAULT_PAYMENT_REFERENCE_RETENTION_SECONDS};
use shared_utils::clock::{Clock, SystemClock};
use shared_utils::signature::verify_hmac_sha512;

use crate::models::{
    ChargeData, ExtensionMetadata, PaymentWebhookError, PaystackEvent, WebhookOutcome,
    CHARGE_SUCCESS_EVENT,
};

/// Authenticates gateway deliveries and turns successful charges into
/// consultation extensions.
pub struct PaystackWebhookService {
    secret_key: String,
    consultations: Arc<ConsultationService>,
    // Best-effort redelivery guard; lost on restart. Entries older than
    // the gateway's retry window are pruned.
    applied_references: RwLock<HashMap<String, DateTime<Utc>>>,
    reference_retention: Duration,
    clock: Arc<dyn Clock>,
}

impl PaystackWebhookService {
    pub fn new(config: &AppConfig, consultations: Arc<ConsultationService>) -> Self {
        Self::with_clock(config, consultations, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &AppConfig,
        consultations: Arc<ConsultationService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if !config.is_payment_configured() {
            warn!("PAYSTACK_SECRET_KEY not set; webhook deliveries will be refused");
        }
        let reference_retention = i64::try_from(config.payment_reference_retention_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_else(|| Duration::seconds(DEFAULT_PAYMENT_REFERENCE_RETENTION_SECONDS as i64));

        Self {
            secret_key: config.paystack_secret_key.clone(),
            consultations,
            applied_references: RwLock::new(HashMap::new()),
            reference_retention,
            clock,
        }
    }

    /// Number of payment references currently remembered.
    pub async fn tracked_references(&self) -> usize {
        self.applied_references.read().await.len()
    }

    /// Records `reference` unless it is already remembered. Expired entries
    /// are dropped first.
    async fn remember_reference(&self, reference: &str) -> bool {
        let now = self.clock.now();
        let retention = self.reference_retention;
        let mut applied = self.applied_references.write().await;

        let before = applied.len();
        applied.retain(|_, applied_at| now - *applied_at <= retention);
        if applied.len() < before {
            debug!("Pruned {} expired payment references", before - applied.len());
        }

        if applied.contains_key(reference) {
            return false;
        }
        applied.insert(reference.to_string(), now);
        true
    }

    pub fn verify_signature(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<(), PaymentWebhookError> {
        if self.secret_key.is_empty() {
            error!("Paystack secret key not configured.");
            return Err(PaymentWebhookError::NotConfigured);
        }

        let signature = signature
            .filter(|s| !s.trim().is_empty())
            .ok_or(PaymentWebhookError::MissingSignature)?;

        if !verify_hmac_sha512(&self.secret_key, raw_body, signature) {
            warn!("Rejected webhook delivery with invalid signature");
            return Err(PaymentWebhookError::InvalidSignature);
        }
        Ok(())
    }

    /// Verify, parse and apply one delivery.
    #[instrument(skip(self, raw_body, signature))]
    pub async fn handle_delivery(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, PaymentWebhookError> {
        self.verify_signature(raw_body, signature)?;

        let event: PaystackEvent = serde_json::from_slice(raw_body)
            .map_err(|e| PaymentWebhookError::InvalidPayload(e.to_string()))?;

        info!("Received Paystack webhook event: {}", event.event);

        if event.event != CHARGE_SUCCESS_EVENT {
            debug!("Ignoring Paystack event {}", event.event);
            return Ok(WebhookOutcome::Ignored { event: event.event });
        }

        let outcome = match self.apply_charge(&event).await {
            Ok(outcome) => outcome,
            Err((reference, err)) => {
                error!("Error processing Paystack webhook: {}", err);
                WebhookOutcome::Failed {
                    reference,
                    reason: err.to_string(),
                }
            }
        };
        Ok(outcome)
    }

    async fn apply_charge(
        &self,
        event: &PaystackEvent,
    ) -> Result<WebhookOutcome, (Option<String>, PaymentWebhookError)> {
        let charge: ChargeData = serde_json::from_value(event.data.clone())
            .map_err(|e| (None, PaymentWebhookError::InvalidPayload(e.to_string())))?;
        let reference = charge.reference;

        let metadata = ExtensionMetadata::from_value(&charge.metadata)
            .map_err(|e| (Some(reference.clone()), e))?;

        if !self.remember_reference(&reference).await {
            info!("Payment reference {} already applied; acknowledging only", reference);
            return Ok(WebhookOutcome::AlreadyApplied { reference });
        }

        match self
            .consultations
            .extend(&metadata.room_name, metadata.minutes_to_extend)
            .await
        {
            Ok(extension) => {
                info!(
                    "Payment {} extended room {} by {} minutes",
                    reference, metadata.room_name, metadata.minutes_to_extend
                );
                Ok(WebhookOutcome::Extended {
                    reference,
                    room_name: metadata.room_name,
                    new_end_at: extension.new_end_at,
                })
            }
            Err(err) => {
                // Let a redelivery try again.
                self.applied_references.write().await.remove(&reference);
                Err((Some(reference), err.into()))
            }
        }
    }
}
