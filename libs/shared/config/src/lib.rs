use std::env;
use tracing::warn;

pub const DEFAULT_TWILIO_VIDEO_BASE_URL: &str = "https://video.twilio.com/v1";
pub const DEFAULT_TWILIO_TOKEN_TTL_SECONDS: i64 = 3600;
pub const DEFAULT_LOBBY_TICK_MILLIS: u64 = 1000;
pub const DEFAULT_LOBBY_IDLE_TTL_SECONDS: u64 = 15 * 60;
pub const DEFAULT_LOBBY_ENDED_GRACE_SECONDS: u64 = 5 * 60;
pub const DEFAULT_LOBBY_SWEEP_SECONDS: u64 = 60;
pub const DEFAULT_ROOM_COMPLETION_TIMEOUT_MILLIS: u64 = 10_000;
/// Paystack retries failed deliveries for up to 72 hours.
pub const DEFAULT_PAYMENT_REFERENCE_RETENTION_SECONDS: u64 = 72 * 60 * 60;
pub const DEFAULT_PORT: u16 = 3000;

/// Which backend holds consultation records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Supabase,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub consultation_store: StoreBackend,
    pub twilio_account_sid: String,
    pub twilio_api_key_sid: String,
    pub twilio_api_key_secret: String,
    pub twilio_video_base_url: String,
    pub twilio_token_ttl_seconds: i64,
    pub paystack_secret_key: String,
    pub payment_reference_retention_seconds: u64,
    pub lobby_tick_millis: u64,
    pub lobby_idle_ttl_seconds: u64,
    pub lobby_ended_grace_seconds: u64,
    pub lobby_sweep_seconds: u64,
    pub room_completion_timeout_millis: u64,
    pub port: u16,
}

fn required(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", name);
        String::new()
    })
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value {:?}, using default", name, raw);
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let supabase_url = required("SUPABASE_URL");
        let supabase_anon_key = required("SUPABASE_ANON_PUBLIC_KEY");

        let consultation_store = match env::var("CONSULTATION_STORE").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("supabase") => StoreBackend::Supabase,
            Ok(other) => {
                warn!("Unknown CONSULTATION_STORE {:?}, choosing from available credentials", other);
                Self::default_backend(&supabase_url, &supabase_anon_key)
            }
            Err(_) => Self::default_backend(&supabase_url, &supabase_anon_key),
        };

        let config = Self {
            supabase_url,
            supabase_anon_key,
            consultation_store,
            twilio_account_sid: required("TWILIO_ACCOUNT_SID"),
            twilio_api_key_sid: required("TWILIO_API_KEY_SID"),
            twilio_api_key_secret: required("TWILIO_API_KEY_SECRET"),
            twilio_video_base_url: env::var("TWILIO_VIDEO_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("TWILIO_VIDEO_BASE_URL not set, using default");
                    DEFAULT_TWILIO_VIDEO_BASE_URL.to_string()
                }),
            twilio_token_ttl_seconds: parsed_or("TWILIO_TOKEN_TTL_SECONDS", DEFAULT_TWILIO_TOKEN_TTL_SECONDS),
            paystack_secret_key: required("PAYSTACK_SECRET_KEY"),
            payment_reference_retention_seconds: parsed_or(
                "PAYMENT_REFERENCE_RETENTION_SECONDS",
                DEFAULT_PAYMENT_REFERENCE_RETENTION_SECONDS,
            ),
            lobby_tick_millis: parsed_or("LOBBY_TICK_MILLIS", DEFAULT_LOBBY_TICK_MILLIS),
            lobby_idle_ttl_seconds: parsed_or("LOBBY_IDLE_TTL_SECONDS", DEFAULT_LOBBY_IDLE_TTL_SECONDS),
            lobby_ended_grace_seconds: parsed_or(
                "LOBBY_ENDED_GRACE_SECONDS",
                DEFAULT_LOBBY_ENDED_GRACE_SECONDS,
            ),
            lobby_sweep_seconds: parsed_or("LOBBY_SWEEP_SECONDS", DEFAULT_LOBBY_SWEEP_SECONDS),
            room_completion_timeout_millis: parsed_or(
                "ROOM_COMPLETION_TIMEOUT_MILLIS",
                DEFAULT_ROOM_COMPLETION_TIMEOUT_MILLIS,
            ),
            port: parsed_or("PORT", DEFAULT_PORT),
        };

        if config.consultation_store == StoreBackend::Memory {
            warn!("Consultations are kept in memory and will be lost on restart");
        }
        if !config.is_video_configured() {
            warn!("Twilio credentials missing - joining and room completion will fail");
        }
        if !config.is_payment_configured() {
            warn!("Paystack secret missing - payment webhooks will be rejected");
        }

        config
    }

    fn default_backend(url: &str, key: &str) -> StoreBackend {
        if url.is_empty() || key.is_empty() {
            StoreBackend::Memory
        } else {
            StoreBackend::Supabase
        }
    }

    pub fn is_store_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    pub fn is_video_configured(&self) -> bool {
        !self.twilio_account_sid.is_empty()
            && !self.twilio_api_key_sid.is_empty()
            && !self.twilio_api_key_secret.is_empty()
            && !self.twilio_video_base_url.is_empty()
    }

    pub fn is_payment_configured(&self) -> bool {
        !self.paystack_secret_key.is_empty()
    }
}
