// libs/video-room-cell/src/services/twilio.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info, warn};

use consultation_cell::normalize_room_name;
use shared_config::{AppConfig, DEFAULT_TWILIO_TOKEN_TTL_SECONDS};
use shared_utils::clock::{Clock, SystemClock};
use shared_utils::jwt::sign_hs256;

use crate::models::{
    AccessTokenClaims, AccessTokenHeader, Grants, JoinCredential, RoomCompletion, TwilioRoom,
    VideoGrant, VideoRoomError,
};
use crate::services::controller::VideoRoomController;

/// Twilio Video client: issues access tokens locally and completes rooms
/// through the REST API.
/// Based on: https://www.twilio.com/docs/video/api/rooms-resource
pub struct TwilioVideoClient {
    client: Client,
    account_sid: String,
    api_key_sid: String,
    api_key_secret: String,
    base_url: String,
    token_ttl: Duration,
    clock: Arc<dyn Clock>,
    configured: bool,
}

impl TwilioVideoClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            client: Client::new(),
            account_sid: config.twilio_account_sid.clone(),
            api_key_sid: config.twilio_api_key_sid.clone(),
            api_key_secret: config.twilio_api_key_secret.clone(),
            base_url: config.twilio_video_base_url.trim_end_matches('/').to_string(),
            token_ttl: Duration::try_seconds(config.twilio_token_ttl_seconds.max(1))
                .unwrap_or_else(|| Duration::seconds(DEFAULT_TWILIO_TOKEN_TTL_SECONDS)),
            clock,
            configured: config.is_video_configured(),
        }
    }

    fn room_url(&self, room_name: &str) -> String {
        format!("{}/Rooms/{}", self.base_url, urlencoding::encode(room_name))
    }

    /// Builds and signs an access token carrying a single video grant.
    pub fn build_access_token(
        &self,
        room_name: &str,
        identity: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<JoinCredential, VideoRoomError> {
        let iat = issued_at.timestamp();
        let expires_at = issued_at.checked_add_signed(self.token_ttl).ok_or_else(|| {
            VideoRoomError::CredentialIssuance {
                message: format!("token lifetime {} overflows the expiry time", self.token_ttl),
            }
        })?;

        let claims = AccessTokenClaims {
            jti: format!("{}-{}", self.api_key_sid, iat),
            iss: self.api_key_sid.clone(),
            sub: self.account_sid.clone(),
            iat,
            exp: expires_at.timestamp(),
            grants: Grants {
                identity: identity.to_string(),
                video: VideoGrant {
                    room: room_name.to_string(),
                },
            },
        };

        let token = sign_hs256(&AccessTokenHeader::default(), &claims, &self.api_key_secret)
            .map_err(|e| VideoRoomError::CredentialIssuance {
                message: e.to_string(),
            })?;

        Ok(JoinCredential {
            token,
            identity: identity.to_string(),
            room_name: room_name.to_string(),
            expires_at: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .unwrap_or(expires_at),
        })
    }

    async fn fetch_room(&self, room_name: &str) -> Result<Option<TwilioRoom>, VideoRoomError> {
        let url = self.room_url(room_name);
        debug!("Fetching video room: {}", url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.api_key_sid, Some(&self.api_key_secret))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response_text = response.text().await?;
        if !status.is_success() {
            error!("Fetching room {} failed: {} - {}", room_name, status, response_text);
            return Err(VideoRoomError::CompletionFailed {
                message: format!("HTTP {}: {}", status, response_text),
            });
        }

        let room: TwilioRoom = serde_json::from_str(&response_text).map_err(|e| {
            VideoRoomError::CompletionFailed {
                message: format!("Failed to parse room response: {}", e),
            }
        })?;

        Ok(Some(room))
    }
}

#[async_trait]
impl VideoRoomController for TwilioVideoClient {
    async fn issue_join_credential(
        &self,
        room_name: &str,
        identity: &str,
    ) -> Result<JoinCredential, VideoRoomError> {
        let room_name = normalize_room_name(room_name);
        let identity = identity.trim();

        if room_name.is_empty() || identity.is_empty() {
            return Err(VideoRoomError::InvalidRequest {
                message: "Missing identity or roomName".to_string(),
            });
        }
        if !self.configured {
            error!("Cannot issue join credential: video provider not configured");
            return Err(VideoRoomError::NotConfigured);
        }

        let credential = self.build_access_token(&room_name, identity, self.clock.now())?;
        info!("Issued join credential for {} in room {}", identity, room_name);
        Ok(credential)
    }

    async fn complete_room(&self, room_name: &str) -> Result<RoomCompletion, VideoRoomError> {
        let room_name = normalize_room_name(room_name);

        if room_name.is_empty() {
            return Err(VideoRoomError::InvalidRequest {
                message: "Missing roomName".to_string(),
            });
        }
        if !self.configured {
            error!("Cannot complete room: video provider not configured");
            return Err(VideoRoomError::NotConfigured);
        }

        let room = match self.fetch_room(&room_name).await? {
            Some(room) => room,
            None => {
                warn!("Room {} not found. Assuming completed or never existed.", room_name);
                return Ok(RoomCompletion::NotFound);
            }
        };

        if room.status == "completed" {
            info!("Room {} was already completed.", room_name);
            return Ok(RoomCompletion::AlreadyCompleted);
        }

        let response = self
            .client
            .post(self.room_url(&room_name))
            .basic_auth(&self.api_key_sid, Some(&self.api_key_secret))
            .form(&[("Status", "completed")])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            // Ended between the fetch and the update.
            return Ok(RoomCompletion::NotFound);
        }
        if !status.is_success() {
            let response_text = response.text().await?;
            error!("Failed to complete room {}: {} - {}", room_name, status, response_text);
            return Err(VideoRoomError::CompletionFailed {
                message: format!("HTTP {}: {}", status, response_text),
            });
        }

        info!("Room {} ({}) completed successfully.", room_name, room.sid);
        Ok(RoomCompletion::Completed)
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}
