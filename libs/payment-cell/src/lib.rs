// libs/payment-cell/src/lib.rs
//! # Payment Cell
//!
//! Receives Paystack webhook deliveries. A signed `charge.success` event whose
//! metadata names a room and a number of minutes extends that consultation.
//! Every authenticated delivery is acknowledged regardless of whether the
//! extension went through; redelivery is the gateway's concern.
//!
//! - `POST /payments/paystack/webhook`

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{ExtensionMetadata, PaymentWebhookError, WebhookOutcome};
pub use router::payment_routes;
pub use services::PaystackWebhookService;
