// libs/consultation-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{
    ConsultationError, ExtendRequest, ScheduleConsultationRequest, SetClientNameRequest,
    VerifyClientRequest, EXTENSION_OFFERS,
};
use crate::services::ConsultationService;

/// Shown for both unknown rooms and uninvited emails on the participant-facing
/// endpoints, so callers cannot tell the two apart.
pub const NOT_INVITED_MESSAGE: &str = "No consultation found for this room and email.";

impl From<ConsultationError> for AppError {
    fn from(err: ConsultationError) -> Self {
        match err {
            ConsultationError::DuplicateRoom => AppError::Conflict(err.to_string()),
            ConsultationError::InvalidSchedule => AppError::ValidationError(err.to_string()),
            ConsultationError::InvalidInput(message) => AppError::ValidationError(message),
            ConsultationError::NotFound => AppError::NotFound(err.to_string()),
            ConsultationError::ClientNotInvited => AppError::NotFound(err.to_string()),
            ConsultationError::StorageFailure(cause) => AppError::Database(cause),
        }
    }
}

fn participant_error(err: ConsultationError) -> AppError {
    match err {
        ConsultationError::NotFound | ConsultationError::ClientNotInvited => {
            AppError::NotFound(NOT_INVITED_MESSAGE.to_string())
        }
        other => other.into(),
    }
}

/// Schedule a new consultation
#[axum::debug_handler]
pub async fn create_consultation(
    State(service): State<Arc<ConsultationService>>,
    Json(request): Json<ScheduleConsultationRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let response = service.schedule(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "consultation": response.consultation,
            "joinPath": response.join_path
        })),
    ))
}

/// Fetch a consultation by room name
#[axum::debug_handler]
pub async fn get_consultation(
    State(service): State<Arc<ConsultationService>>,
    Path(room_name): Path<String>,
) -> Result<Json<Value>, AppError> {
    let consultation = service.get_details(&room_name).await?;
    Ok(Json(json!(consultation)))
}

/// Check that an email is on the room's roster
#[axum::debug_handler]
pub async fn verify_client(
    State(service): State<Arc<ConsultationService>>,
    Path(room_name): Path<String>,
    Json(request): Json<VerifyClientRequest>,
) -> Result<Json<Value>, AppError> {
    let verified = service
        .verify_client_email(&room_name, &request.email)
        .await
        .map_err(participant_error)?;

    Ok(Json(json!({
        "success": true,
        "clientName": verified.client_name
    })))
}

/// Set the display name of a roster entry
#[axum::debug_handler]
pub async fn set_client_name(
    State(service): State<Arc<ConsultationService>>,
    Path(room_name): Path<String>,
    Json(request): Json<SetClientNameRequest>,
) -> Result<Json<Value>, AppError> {
    service
        .set_client_name(&room_name, &request.email, &request.name)
        .await
        .map_err(participant_error)?;

    Ok(Json(json!({ "success": true })))
}

/// Push the consultation's end time back
#[axum::debug_handler]
pub async fn extend_consultation(
    State(service): State<Arc<ConsultationService>>,
    Path(room_name): Path<String>,
    Json(request): Json<ExtendRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = service.extend(&room_name, request.minutes).await?;

    Ok(Json(json!({
        "success": true,
        "newEndAt": outcome.new_end_at
    })))
}

/// The reference extension menu
pub async fn list_extension_offers() -> Json<Value> {
    Json(json!({ "offers": EXTENSION_OFFERS }))
}
