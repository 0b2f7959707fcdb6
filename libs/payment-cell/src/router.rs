// libs/payment-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::post, Router};

use crate::handlers::*;
use crate::services::PaystackWebhookService;

/// Payment gateway callbacks, mounted under `/payments`.
pub fn payment_routes(service: Arc<PaystackWebhookService>) -> Router {
    Router::new()
        .route("/paystack/webhook", post(paystack_webhook))
        .with_state(service)
}
