// libs/consultation-cell/src/services/store.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Consultation, NewConsultation, StoreError};

/// Durable home of consultation records, keyed by normalized room name.
///
/// Implementations must reject an insert whose normalized room name is
/// already present. Callers pass keys and emails already normalized.
#[async_trait]
pub trait ConsultationStore: Send + Sync {
    async fn find_by_room(&self, normalized_room_name: &str) -> Result<Option<Consultation>, StoreError>;

    async fn insert(&self, consultation: NewConsultation) -> Result<Consultation, StoreError>;

    /// Returns `false` when the room or the email is not on record.
    async fn set_client_name(
        &self,
        normalized_room_name: &str,
        email: &str,
        name: &str,
    ) -> Result<bool, StoreError>;

    /// Returns the updated record, or `None` when nothing was written.
    async fn set_end_at(
        &self,
        normalized_room_name: &str,
        end_at: DateTime<Utc>,
    ) -> Result<Option<Consultation>, StoreError>;
}

/// Process-local store used by tests and unconfigured deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConsultationStore {
    consultations: Arc<RwLock<HashMap<String, Consultation>>>,
}

impl InMemoryConsultationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.consultations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.consultations.read().await.is_empty()
    }
}

#[async_trait]
impl ConsultationStore for InMemoryConsultationStore {
    async fn find_by_room(&self, normalized_room_name: &str) -> Result<Option<Consultation>, StoreError> {
        Ok(self.consultations.read().await.get(normalized_room_name).cloned())
    }

    async fn insert(&self, consultation: NewConsultation) -> Result<Consultation, StoreError> {
        let mut consultations = self.consultations.write().await;

        if consultations.contains_key(&consultation.normalized_room_name) {
            return Err(StoreError::Duplicate);
        }

        let record = consultation.with_id(Uuid::new_v4().to_string());
        debug!("Inserted consultation {} for room {}", record.id, record.normalized_room_name);
        consultations.insert(record.normalized_room_name.clone(), record.clone());

        Ok(record)
    }

    async fn set_client_name(
        &self,
        normalized_room_name: &str,
        email: &str,
        name: &str,
    ) -> Result<bool, StoreError> {
        let mut consultations = self.consultations.write().await;

        let Some(consultation) = consultations.get_mut(normalized_room_name) else {
            return Ok(false);
        };

        match consultation
            .clients
            .iter_mut()
            .find(|c| c.email.eq_ignore_ascii_case(email))
        {
            Some(client) => {
                client.name = Some(name.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_end_at(
        &self,
        normalized_room_name: &str,
        end_at: DateTime<Utc>,
    ) -> Result<Option<Consultation>, StoreError> {
        let mut consultations = self.consultations.write().await;

        Ok(consultations.get_mut(normalized_room_name).map(|consultation| {
            consultation.end_at = end_at;
            consultation.clone()
        }))
    }
}
