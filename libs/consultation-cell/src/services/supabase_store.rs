// libs/consultation-cell/src/services/supabase_store.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use shared_config::AppConfig;
use shared_database::{DatabaseError, SupabaseClient};

use crate::models::{Client, Consultation, NewConsultation, StoreError};
use crate::services::store::ConsultationStore;

const TABLE_PATH: &str = "/rest/v1/consultations";
const MAX_ROSTER_WRITE_ATTEMPTS: usize = 5;

/// Row shape of the `consultations` table.
#[derive(Debug, Deserialize)]
struct RosterRow {
    clients: Value,
}

/// Copy of `roster` with the matching client's name set, or `None` when the
/// email is not on it. Stored entries are otherwise left untouched.
fn with_client_name(roster: &Value, email: &str, name: &str) -> Option<Value> {
    let mut updated = roster.clone();
    let entry = updated.as_array_mut()?.iter_mut().find(|c| {
        c.get("email")
            .and_then(Value::as_str)
            .is_some_and(|e| e.eq_ignore_ascii_case(email))
    })?;
    entry
        .as_object_mut()?
        .insert("name".to_string(), Value::String(name.to_string()));
    Some(updated)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConsultationRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    host_name: String,
    room_name: String,
    normalized_room_name: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    clients: Vec<Client>,
    created_at: DateTime<Utc>,
}

impl From<NewConsultation> for ConsultationRow {
    fn from(c: NewConsultation) -> Self {
        Self {
            id: None,
            host_name: c.host_name,
            room_name: c.room_name,
            normalized_room_name: c.normalized_room_name,
            start_at: c.start_at,
            end_at: c.end_at,
            clients: c.clients,
            created_at: c.created_at,
        }
    }
}

impl TryFrom<ConsultationRow> for Consultation {
    type Error = StoreError;

    fn try_from(row: ConsultationRow) -> Result<Self, Self::Error> {
        let id = row
            .id
            .ok_or_else(|| StoreError::Backend("consultation row returned without an id".to_string()))?;

        Ok(Consultation {
            id,
            host_name: row.host_name,
            room_name: row.room_name,
            normalized_room_name: row.normalized_room_name,
            start_at: row.start_at,
            end_at: row.end_at,
            clients: row
                .clients
                .into_iter()
                .map(|c| Client {
                    email: c.email.to_lowercase(),
                    name: c.name,
                })
                .collect(),
            created_at: row.created_at,
        })
    }
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(_) => StoreError::Duplicate,
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// `ConsultationStore` backed by the hosted document store's REST API.
/// Uniqueness of `normalized_room_name` is enforced by a UNIQUE constraint.
pub struct SupabaseConsultationStore {
    supabase: SupabaseClient,
}

impl SupabaseConsultationStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    fn room_filter(normalized_room_name: &str) -> String {
        format!(
            "{}?normalized_room_name=eq.{}",
            TABLE_PATH,
            urlencoding::encode(normalized_room_name)
        )
    }

    async fn fetch_roster(&self, normalized_room_name: &str) -> Result<Option<Value>, StoreError> {
        let path = format!("{}&select=clients&limit=1", Self::room_filter(normalized_room_name));
        let rows: Vec<RosterRow> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next().map(|row| row.clients))
    }

    fn first(rows: Vec<ConsultationRow>) -> Result<Option<Consultation>, StoreError> {
        rows.into_iter().next().map(Consultation::try_from).transpose()
    }
}

#[async_trait]
impl ConsultationStore for SupabaseConsultationStore {
    async fn find_by_room(&self, normalized_room_name: &str) -> Result<Option<Consultation>, StoreError> {
        debug!("Fetching consultation for room {}", normalized_room_name);

        let path = format!("{}&limit=1", Self::room_filter(normalized_room_name));
        let rows: Vec<ConsultationRow> = self.supabase.request(Method::GET, &path, None).await?;

        Self::first(rows)
    }

    async fn insert(&self, consultation: NewConsultation) -> Result<Consultation, StoreError> {
        debug!("Inserting consultation for room {}", consultation.normalized_room_name);

        let body = serde_json::to_value(ConsultationRow::from(consultation))
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows: Vec<ConsultationRow> = self
            .supabase
            .request_with_headers(
                Method::POST,
                TABLE_PATH,
                Some(body),
                Some(SupabaseClient::return_representation()),
            )
            .await?;

        Self::first(rows)?.ok_or_else(|| {
            error!("Consultation insert returned no rows");
            StoreError::Backend("Failed to schedule consultation in database.".to_string())
        })
    }

    async fn set_client_name(
        &self,
        normalized_room_name: &str,
        email: &str,
        name: &str,
    ) -> Result<bool, StoreError> {
        // The roster is a JSON column. Each write is conditional on the roster
        // it was computed from, so concurrent renames of different clients
        // cannot overwrite each other.
        for attempt in 1..=MAX_ROSTER_WRITE_ATTEMPTS {
            let Some(current) = self.fetch_roster(normalized_room_name).await? else {
                return Ok(false);
            };
            let Some(updated) = with_client_name(&current, email, name) else {
                return Ok(false);
            };

            let current_json = serde_json::to_string(&current)
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            let path = format!(
                "{}&clients=eq.{}",
                Self::room_filter(normalized_room_name),
                urlencoding::encode(&current_json)
            );

            let rows: Vec<ConsultationRow> = self
                .supabase
                .request_with_headers(
                    Method::PATCH,
                    &path,
                    Some(json!({ "clients": updated })),
                    Some(SupabaseClient::return_representation()),
                )
                .await?;

            if !rows.is_empty() {
                return Ok(true);
            }
            debug!(
                "Roster for room {} changed during name update (attempt {})",
                normalized_room_name, attempt
            );
        }

        warn!(
            "Client name update for room {} gave up after {} conflicting writes",
            normalized_room_name, MAX_ROSTER_WRITE_ATTEMPTS
        );
        Err(StoreError::Backend(
            "Roster was modified concurrently; please retry.".to_string(),
        ))
    }

    async fn set_end_at(
        &self,
        normalized_room_name: &str,
        end_at: DateTime<Utc>,
    ) -> Result<Option<Consultation>, StoreError> {
        let rows: Vec<ConsultationRow> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &Self::room_filter(normalized_room_name),
                Some(json!({ "end_at": end_at.to_rfc3339() })),
                Some(SupabaseClient::return_representation()),
            )
            .await?;

        Self::first(rows)
    }
}
