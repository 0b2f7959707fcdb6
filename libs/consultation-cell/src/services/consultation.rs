// libs/consultation-cell/src/services/consultation.rs
use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, error, info, instrument, warn};

use shared_utils::clock::{Clock, SystemClock};

use crate::models::{
    Client, Consultation, ConsultationError, ExtensionOutcome, NewConsultation,
    ScheduleConsultationRequest, ScheduleConsultationResponse, VerifiedClient,
};
use crate::services::store::ConsultationStore;
use crate::services::validation::{
    normalize_email, normalize_room_name, parse_client_emails, validate_display_name,
    validate_email, validate_host_name, validate_room_name,
};

/// Business rules for scheduling, roster lookups and time extensions.
/// Durable state lives behind the injected `ConsultationStore`.
pub struct ConsultationService {
    store: Arc<dyn ConsultationStore>,
    clock: Arc<dyn Clock>,
}

impl ConsultationService {
    pub fn new(store: Arc<dyn ConsultationStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn with_system_clock(store: Arc<dyn ConsultationStore>) -> Self {
        Self::new(store, Arc::new(SystemClock))
    }

    /// Validate and persist a new consultation, returning it with its join path.
    #[instrument(skip(self, request), fields(room = %request.room_name))]
    pub async fn schedule(
        &self,
        request: ScheduleConsultationRequest,
    ) -> Result<ScheduleConsultationResponse, ConsultationError> {
        let host_name = validate_host_name(&request.host_name)?;
        let room_name = validate_room_name(&request.room_name)?;
        let emails = parse_client_emails(&request.client_emails)?;

        if request.end_at <= request.start_at {
            return Err(ConsultationError::InvalidSchedule);
        }

        let normalized_room_name = normalize_room_name(&room_name);

        if self.store.find_by_room(&normalized_room_name).await?.is_some() {
            debug!("Room {} already taken", normalized_room_name);
            return Err(ConsultationError::DuplicateRoom);
        }

        let new_consultation = NewConsultation {
            host_name,
            room_name,
            normalized_room_name,
            start_at: request.start_at,
            end_at: request.end_at,
            clients: emails.into_iter().map(Client::invited).collect(),
            created_at: self.clock.now(),
        };

        let consultation = self.store.insert(new_consultation).await.map_err(|e| {
            let err = ConsultationError::from(e);
            if let ConsultationError::StorageFailure(cause) = &err {
                error!("Failed to persist consultation: {}", cause);
            }
            err
        })?;

        info!(
            "Scheduled consultation {} ({} clients) for room {}",
            consultation.id,
            consultation.clients.len(),
            consultation.normalized_room_name
        );

        Ok(ScheduleConsultationResponse {
            join_path: consultation.join_path(),
            consultation,
        })
    }

    /// Case-insensitive lookup by room name.
    pub async fn get_details(&self, room_name: &str) -> Result<Consultation, ConsultationError> {
        let key = normalize_room_name(room_name);
        self.store
            .find_by_room(&key)
            .await
            .map_err(|e| self.storage_failure("fetch consultation", e.into()))?
            .ok_or(ConsultationError::NotFound)
    }

    /// Checks the roster for `email`; the returned name tells a returning
    /// participant apart from a first-time one.
    pub async fn verify_client_email(
        &self,
        room_name: &str,
        email: &str,
    ) -> Result<VerifiedClient, ConsultationError> {
        let email = validate_email(email)?;
        let consultation = self.get_details(room_name).await?;

        let client = consultation
            .find_client(&email)
            .ok_or(ConsultationError::ClientNotInvited)?;

        debug!(
            "Verified {} for room {} (returning: {})",
            email,
            consultation.normalized_room_name,
            client.name.is_some()
        );

        Ok(VerifiedClient {
            email,
            client_name: client.name.clone(),
        })
    }

    /// Assigns a display name to a roster entry. Re-setting the same name succeeds.
    pub async fn set_client_name(
        &self,
        room_name: &str,
        email: &str,
        name: &str,
    ) -> Result<(), ConsultationError> {
        let name = validate_display_name(name)?;
        let key = normalize_room_name(room_name);
        let email = normalize_email(email);

        let matched = self
            .store
            .set_client_name(&key, &email, &name)
            .await
            .map_err(|e| self.storage_failure("update client name", e.into()))?;

        if !matched {
            return Err(ConsultationError::NotFound);
        }

        info!("Client {} in room {} is now known as {}", email, key, name);
        Ok(())
    }

    /// Pushes `end_at` back by `minutes`. No cap on cumulative extensions.
    #[instrument(skip(self))]
    pub async fn extend(&self, room_name: &str, minutes: i64) -> Result<ExtensionOutcome, ConsultationError> {
        if minutes <= 0 {
            return Err(ConsultationError::InvalidInput(
                "Extension minutes must be a positive number.".to_string(),
            ));
        }

        let consultation = self.get_details(room_name).await?;

        let new_end_at = Duration::try_minutes(minutes)
            .and_then(|delta| consultation.end_at.checked_add_signed(delta))
            .ok_or_else(|| ConsultationError::InvalidInput("Extension is too large.".to_string()))?;

        let updated = self
            .store
            .set_end_at(&consultation.normalized_room_name, new_end_at)
            .await
            .map_err(|e| self.storage_failure("extend consultation", e.into()))?;

        if updated.is_none() {
            warn!("Extension of room {} did not apply", consultation.normalized_room_name);
            return Err(ConsultationError::StorageFailure(
                "Failed to update consultation end time.".to_string(),
            ));
        }

        info!(
            "Extended room {} by {} minutes, now ends at {}",
            consultation.normalized_room_name, minutes, new_end_at
        );

        Ok(ExtensionOutcome { new_end_at })
    }

    fn storage_failure(&self, operation: &str, err: ConsultationError) -> ConsultationError {
        if let ConsultationError::StorageFailure(cause) = &err {
            error!("Failed to {}: {}", operation, cause);
        }
        err
    }
}
