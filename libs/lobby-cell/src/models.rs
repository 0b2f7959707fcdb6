// libs/lobby-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use consultation_cell::ConsultationError;
use video_room_cell::{JoinCredential, VideoRoomError};

use crate::state::{Countdown, LobbySession, LobbyStage};

/// Everything a thin client needs to render the lobby.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LobbySnapshot {
    pub id: Uuid,
    pub room_name: String,
    pub host_name: String,
    pub stage: LobbyStage,
    pub countdown: Countdown,
    pub status_message: String,
    pub can_join: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<JoinCredential>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl LobbySnapshot {
    pub fn capture(id: Uuid, session: &LobbySession) -> Self {
        let consultation = session.consultation();
        Self {
            id,
            room_name: consultation.normalized_room_name.clone(),
            host_name: consultation.host_name.clone(),
            stage: session.stage(),
            countdown: session.countdown(),
            status_message: session.status_message(),
            can_join: session.can_join(),
            email: session.email().map(str::to_string),
            client_name: session.client_name().map(str::to_string),
            credential: session.credential().cloned(),
            start_at: consultation.start_at,
            end_at: consultation.end_at,
        }
    }
}

// ==============================================================================
// REQUEST DTOs
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLobbyRequest {
    pub room_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitEmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitNameRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LobbyExtendRequest {
    pub minutes: i64,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LobbyError {
    #[error("Cannot {action} while in stage {from:?}")]
    InvalidTransition {
        from: LobbyStage,
        action: &'static str,
    },

    #[error("This consultation has ended.")]
    SessionEnded,

    #[error("Another action is still in progress.")]
    ActionInFlight,

    #[error("{0}")]
    NotJoinable(String),

    #[error("Lobby session not found.")]
    SessionNotFound,

    #[error(transparent)]
    Consultation(#[from] ConsultationError),

    #[error(transparent)]
    Video(#[from] VideoRoomError),
}
