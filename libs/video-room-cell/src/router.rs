// libs/video-room-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::services::VideoRoomController;

/// Video credential and room lifecycle routes, mounted under `/video`.
pub fn video_room_routes(controller: Arc<dyn VideoRoomController>) -> Router {
    Router::new()
        .route("/health", get(video_health_check))
        .route("/token", post(issue_token))
        .route("/rooms/complete", post(complete_room))
        .with_state(controller)
}
