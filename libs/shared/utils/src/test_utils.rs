use std::sync::Arc;
use chrono::{DateTime, TimeZone, Utc};

use shared_config::{
    AppConfig, StoreBackend, DEFAULT_LOBBY_ENDED_GRACE_SECONDS, DEFAULT_LOBBY_IDLE_TTL_SECONDS,
    DEFAULT_LOBBY_SWEEP_SECONDS, DEFAULT_PAYMENT_REFERENCE_RETENTION_SECONDS,
    DEFAULT_ROOM_COMPLETION_TIMEOUT_MILLIS, DEFAULT_TWILIO_TOKEN_TTL_SECONDS,
};

use crate::signature::hmac_sha512_hex;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub twilio_account_sid: String,
    pub twilio_api_key_sid: String,
    pub twilio_api_key_secret: String,
    pub twilio_video_base_url: String,
    pub paystack_secret_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            twilio_account_sid: "ACtest00000000000000000000000000".to_string(),
            twilio_api_key_sid: "SKtest00000000000000000000000000".to_string(),
            twilio_api_key_secret: "test-api-key-secret-long-enough-for-hmac".to_string(),
            twilio_video_base_url: "http://localhost:1".to_string(),
            paystack_secret_key: "sk_test_paystack_secret".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            consultation_store: StoreBackend::Memory,
            twilio_account_sid: self.twilio_account_sid.clone(),
            twilio_api_key_sid: self.twilio_api_key_sid.clone(),
            twilio_api_key_secret: self.twilio_api_key_secret.clone(),
            twilio_video_base_url: self.twilio_video_base_url.clone(),
            twilio_token_ttl_seconds: DEFAULT_TWILIO_TOKEN_TTL_SECONDS,
            paystack_secret_key: self.paystack_secret_key.clone(),
            payment_reference_retention_seconds: DEFAULT_PAYMENT_REFERENCE_RETENTION_SECONDS,
            lobby_tick_millis: 10,
            lobby_idle_ttl_seconds: DEFAULT_LOBBY_IDLE_TTL_SECONDS,
            lobby_ended_grace_seconds: DEFAULT_LOBBY_ENDED_GRACE_SECONDS,
            lobby_sweep_seconds: DEFAULT_LOBBY_SWEEP_SECONDS,
            room_completion_timeout_millis: DEFAULT_ROOM_COMPLETION_TIMEOUT_MILLIS,
            port: 0,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }

    pub fn with_twilio_base_url(mut self, url: &str) -> Self {
        self.twilio_video_base_url = url.to_string();
        self
    }

    pub fn with_supabase_url(mut self, url: &str) -> Self {
        self.supabase_url = url.to_string();
        self
    }

    /// Signs a webhook body the way the payment gateway would.
    pub fn sign_webhook(&self, body: &str) -> String {
        hmac_sha512_hex(&self.paystack_secret_key, body.as_bytes())
    }
}

/// 2025-03-01T09:00:00Z, the reference instant used across test suites.
pub fn reference_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}
