// libs/consultation-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::*;
use crate::services::ConsultationService;

/// Host scheduling and participant roster routes, mounted under `/consultations`.
pub fn consultation_routes(service: Arc<ConsultationService>) -> Router {
    Router::new()
        .route("/", post(create_consultation))
        .route("/extension-offers", get(list_extension_offers))
        .route("/{room_name}", get(get_consultation))
        .route("/{room_name}/verify", post(verify_client))
        .route("/{room_name}/clients/name", put(set_client_name))
        .route("/{room_name}/extend", post(extend_consultation))
        .with_state(service)
}
