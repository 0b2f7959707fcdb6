// libs/consultation-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==============================================================================
// CONSULTATION DOMAIN MODELS
// ==============================================================================

/// An invited participant, embedded in its consultation's roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Client {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Client {
    pub fn invited(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }
}

/// A scheduled, time-boxed video session between a host and invited clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    pub id: String,
    pub host_name: String,
    pub room_name: String,
    pub normalized_room_name: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub clients: Vec<Client>,
    pub created_at: DateTime<Utc>,
}

impl Consultation {
    pub fn find_client(&self, normalized_email: &str) -> Option<&Client> {
        self.clients
            .iter()
            .find(|c| c.email.eq_ignore_ascii_case(normalized_email))
    }

    pub fn join_path(&self) -> String {
        join_path(&self.normalized_room_name)
    }
}

pub fn join_path(normalized_room_name: &str) -> String {
    format!("/consult/{}", normalized_room_name)
}

/// A validated record ready for insertion; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConsultation {
    pub host_name: String,
    pub room_name: String,
    pub normalized_room_name: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub clients: Vec<Client>,
    pub created_at: DateTime<Utc>,
}

impl NewConsultation {
    pub fn with_id(self, id: String) -> Consultation {
        Consultation {
            id,
            host_name: self.host_name,
            room_name: self.room_name,
            normalized_room_name: self.normalized_room_name,
            start_at: self.start_at,
            end_at: self.end_at,
            clients: self.clients,
            created_at: self.created_at,
        }
    }
}

/// A priced entry on the extension menu. Amounts are in minor currency units.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionOffer {
    pub minutes: i64,
    pub amount_minor: u64,
    pub currency: &'static str,
}

pub const EXTENSION_OFFERS: [ExtensionOffer; 3] = [
    ExtensionOffer { minutes: 15, amount_minor: 500, currency: "USD" },
    ExtensionOffer { minutes: 30, amount_minor: 900, currency: "USD" },
    ExtensionOffer { minutes: 60, amount_minor: 1500, currency: "USD" },
];

// ==============================================================================
// REQUEST / RESPONSE DTOs
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConsultationRequest {
    pub host_name: String,
    pub room_name: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub client_emails: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConsultationResponse {
    pub consultation: Consultation,
    pub join_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyClientRequest {
    pub email: String,
}

/// Result of a roster lookup. `client_name` is present for returning participants.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedClient {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetClientNameRequest {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtendRequest {
    pub minutes: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionOutcome {
    pub new_end_at: DateTime<Utc>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsultationError {
    #[error("Room name already exists. Please choose a unique name.")]
    DuplicateRoom,

    #[error("End time must be after start time.")]
    InvalidSchedule,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Consultation not found.")]
    NotFound,

    #[error("No consultation scheduled for this email.")]
    ClientNotInvited,

    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

/// Failures raised by a `ConsultationStore` backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("A consultation with this room name already exists")]
    Duplicate,

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for ConsultationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => ConsultationError::DuplicateRoom,
            StoreError::Backend(message) => ConsultationError::StorageFailure(message),
        }
    }
}
