// libs/lobby-cell/src/handlers.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use consultation_cell::handlers::NOT_INVITED_MESSAGE;
use consultation_cell::ConsultationError;
use shared_models::error::AppError;

use crate::models::{
    LobbyError, LobbyExtendRequest, LobbySnapshot, OpenLobbyRequest, SubmitEmailRequest,
    SubmitNameRequest,
};
use crate::registry::LobbyRegistry;

impl From<LobbyError> for AppError {
    fn from(err: LobbyError) -> Self {
        match err {
            LobbyError::InvalidTransition { .. }
            | LobbyError::SessionEnded
            | LobbyError::ActionInFlight
            | LobbyError::NotJoinable(_) => AppError::Conflict(err.to_string()),
            LobbyError::SessionNotFound => AppError::NotFound(err.to_string()),
            LobbyError::Consultation(ConsultationError::ClientNotInvited) => {
                AppError::NotFound(NOT_INVITED_MESSAGE.to_string())
            }
            LobbyError::Consultation(inner) => inner.into(),
            LobbyError::Video(inner) => inner.into(),
        }
    }
}

/// Open a lobby session for a room
#[axum::debug_handler]
pub async fn open_session(
    State(registry): State<LobbyRegistry>,
    Json(request): Json<OpenLobbyRequest>,
) -> Result<(StatusCode, Json<LobbySnapshot>), AppError> {
    let controller = registry.open(&request.room_name).await?;
    Ok((StatusCode::CREATED, Json(controller.snapshot().await)))
}

#[axum::debug_handler]
pub async fn get_session(
    State(registry): State<LobbyRegistry>,
    Path(id): Path<Uuid>,
) -> Result<Json<LobbySnapshot>, AppError> {
    let controller = registry.get(id).await?;
    Ok(Json(controller.snapshot().await))
}

#[axum::debug_handler]
pub async fn submit_email(
    State(registry): State<LobbyRegistry>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitEmailRequest>,
) -> Result<Json<LobbySnapshot>, AppError> {
    let controller = registry.get(id).await?;
    Ok(Json(controller.submit_email(&request.email).await?))
}

#[axum::debug_handler]
pub async fn submit_name(
    State(registry): State<LobbyRegistry>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitNameRequest>,
) -> Result<Json<LobbySnapshot>, AppError> {
    let controller = registry.get(id).await?;
    Ok(Json(controller.submit_name(&request.name).await?))
}

#[axum::debug_handler]
pub async fn join_call(
    State(registry): State<LobbyRegistry>,
    Path(id): Path<Uuid>,
) -> Result<Json<LobbySnapshot>, AppError> {
    let controller = registry.get(id).await?;
    Ok(Json(controller.join().await?))
}

#[axum::debug_handler]
pub async fn leave_call(
    State(registry): State<LobbyRegistry>,
    Path(id): Path<Uuid>,
) -> Result<Json<LobbySnapshot>, AppError> {
    let controller = registry.get(id).await?;
    Ok(Json(controller.leave().await?))
}

#[axum::debug_handler]
pub async fn extend_session(
    State(registry): State<LobbyRegistry>,
    Path(id): Path<Uuid>,
    Json(request): Json<LobbyExtendRequest>,
) -> Result<Json<LobbySnapshot>, AppError> {
    let controller = registry.get(id).await?;
    Ok(Json(controller.extend(request.minutes).await?))
}

/// Tear down a session and stop its countdown
#[axum::debug_handler]
pub async fn close_session(
    State(registry): State<LobbyRegistry>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    registry.close(id).await?;
    Ok(Json(json!({ "success": true })))
}
