// libs/lobby-cell/src/router.rs
use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::registry::LobbyRegistry;

/// Server-hosted lobby sessions, mounted under `/lobby`.
pub fn lobby_routes(registry: LobbyRegistry) -> Router {
    Router::new()
        .route("/sessions", post(open_session))
        .route("/sessions/{id}", get(get_session).delete(close_session))
        .route("/sessions/{id}/email", post(submit_email))
        .route("/sessions/{id}/name", post(submit_name))
        .route("/sessions/{id}/join", post(join_call))
        .route("/sessions/{id}/leave", post(leave_call))
        .route("/sessions/{id}/extend", post(extend_session))
        .with_state(registry)
}
