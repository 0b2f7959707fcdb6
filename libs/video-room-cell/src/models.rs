// libs/video-room-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==============================================================================
// VIDEO ROOM MODELS
// ==============================================================================

/// Opaque, time-limited admission to the video transport for one room.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JoinCredential {
    pub token: String,
    pub identity: String,
    pub room_name: String,
    pub expires_at: DateTime<Utc>,
}

/// How a completion request was satisfied. Every variant counts as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomCompletion {
    Completed,
    AlreadyCompleted,
    NotFound,
}

impl RoomCompletion {
    pub fn message(&self, room_name: &str) -> String {
        match self {
            RoomCompletion::Completed => format!("Room {} completed.", room_name),
            RoomCompletion::AlreadyCompleted => format!("Room {} already completed.", room_name),
            RoomCompletion::NotFound => format!("Room {} not found or already completed.", room_name),
        }
    }
}

/// Subset of the provider's room resource we act on.
#[derive(Debug, Clone, Deserialize)]
pub struct TwilioRoom {
    pub sid: String,
    #[serde(default)]
    pub unique_name: Option<String>,
    pub status: String,
}

// ==============================================================================
// ACCESS TOKEN CLAIMS
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AccessTokenHeader {
    pub typ: &'static str,
    pub alg: &'static str,
    pub cty: &'static str,
}

impl Default for AccessTokenHeader {
    fn default() -> Self {
        Self {
            typ: "JWT",
            alg: "HS256",
            cty: "twilio-fpa;v=1",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoGrant {
    pub room: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Grants {
    pub identity: String,
    pub video: VideoGrant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessTokenClaims {
    pub jti: String,
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub grants: Grants,
}

// ==============================================================================
// REQUEST DTOs
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub room_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRoomRequest {
    #[serde(default)]
    pub room_name: String,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VideoRoomError {
    #[error("Video provider credentials not configured")]
    NotConfigured,

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Failed to issue join credential: {message}")]
    CredentialIssuance { message: String },

    #[error("Failed to complete room: {message}")]
    CompletionFailed { message: String },
}

impl From<reqwest::Error> for VideoRoomError {
    fn from(err: reqwest::Error) -> Self {
        VideoRoomError::CompletionFailed {
            message: err.to_string(),
        }
    }
}
