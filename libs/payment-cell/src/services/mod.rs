// libs/payment-cell/src/services/mod.rs

pub mod webhook;

pub use webhook::PaystackWebhookService;
