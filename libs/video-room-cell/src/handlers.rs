// libs/video-room-cell/src/handlers.rs
use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::error;

use consultation_cell::normalize_room_name;
use shared_models::error::AppError;

use crate::models::{CompleteRoomRequest, TokenRequest, VideoRoomError};
use crate::services::VideoRoomController;

impl From<VideoRoomError> for AppError {
    fn from(err: VideoRoomError) -> Self {
        match err {
            VideoRoomError::NotConfigured => AppError::Internal(err.to_string()),
            VideoRoomError::InvalidRequest { message } => AppError::BadRequest(message),
            VideoRoomError::CredentialIssuance { .. } => AppError::Internal(err.to_string()),
            VideoRoomError::CompletionFailed { .. } => AppError::ExternalService(err.to_string()),
        }
    }
}

/// Issue a join credential for one identity in one room
#[axum::debug_handler]
pub async fn issue_token(
    State(controller): State<Arc<dyn VideoRoomController>>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<Value>, AppError> {
    let credential = controller
        .issue_join_credential(&request.room_name, &request.identity)
        .await?;

    Ok(Json(json!({
        "token": credential.token,
        "identity": credential.identity,
        "roomName": credential.room_name,
        "expiresAt": credential.expires_at
    })))
}

/// Force-complete a room
#[axum::debug_handler]
pub async fn complete_room(
    State(controller): State<Arc<dyn VideoRoomController>>,
    Json(request): Json<CompleteRoomRequest>,
) -> Result<Json<Value>, AppError> {
    let room_name = normalize_room_name(&request.room_name);
    let completion = controller.complete_room(&room_name).await.map_err(|e| {
        error!("Error completing room {}: {}", room_name, e);
        AppError::from(e)
    })?;

    Ok(Json(json!({
        "success": true,
        "message": completion.message(&room_name)
    })))
}

/// Reports whether provider credentials are present
pub async fn video_health_check(
    State(controller): State<Arc<dyn VideoRoomController>>,
) -> Json<Value> {
    let configured = controller.is_configured();
    Json(json!({
        "status": if configured { "healthy" } else { "unconfigured" },
        "configured": configured,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
