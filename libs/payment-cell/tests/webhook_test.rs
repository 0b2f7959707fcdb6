use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::{json, Value};
use tower::ServiceExt;

use consultation_cell::{ConsultationService, InMemoryConsultationStore, ScheduleConsultationRequest};
use payment_cell::{payment_routes, PaymentWebhookError, PaystackWebhookService, WebhookOutcome};
use shared_utils::clock::ManualClock;
use shared_utils::test_utils::{reference_instant, TestConfig};

const WEBHOOK: &str = "/paystack/webhook";

async fn setup(config: &TestConfig) -> (Arc<PaystackWebhookService>, Arc<ConsultationService>) {
    let consultations = Arc::new(ConsultationService::new(
        Arc::new(InMemoryConsultationStore::new()),
        Arc::new(ManualClock::new(reference_instant())),
    ));
    let start = reference_instant();
    consultations
        .schedule(ScheduleConsultationRequest {
            host_name: "Dr. Bello".to_string(),
            room_name: "room-1".to_string(),
            start_at: start,
            end_at: start + Duration::minutes(30),
            client_emails: "alice@example.com".to_string(),
        })
        .await
        .unwrap();

    let service = Arc::new(PaystackWebhookService::new(
        &config.to_app_config(),
        consultations.clone(),
    ));
    (service, consultations)
}

fn charge_success(reference: &str, metadata: Value) -> String {
    json!({
        "event": "charge.success",
        "data": { "reference": reference, "amount": 50000, "metadata": metadata }
    })
    .to_string()
}

async fn deliver(app: &Router, body: &str, signature: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri(WEBHOOK)
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        request = request.header("x-paystack-signature", signature);
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_signed_charge_extends_consultation() {
    let config = TestConfig::default();
    let (service, consultations) = setup(&config).await;
    let app = payment_routes(service);

    let body = charge_success("ref-001", json!({"roomName": "Room-1", "minutesToExtend": "15"}));
    let (status, json) = deliver(&app, &body, Some(&config.sign_webhook(&body))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"received": true}));
    let details = consultations.get_details("room-1").await.unwrap();
    assert_eq!(details.end_at, reference_instant() + Duration::minutes(45));
}

#[tokio::test]
async fn test_redelivery_is_acknowledged_but_not_reapplied() {
    let config = TestConfig::default();
    let (service, consultations) = setup(&config).await;

    let body = charge_success("ref-002", json!({"room_name": "room-1", "minutes_to_extend": 30}));
    let signature = config.sign_webhook(&body);

    let first = service.handle_delivery(body.as_bytes(), Some(&signature)).await.unwrap();
    let second = service.handle_delivery(body.as_bytes(), Some(&signature)).await.unwrap();

    assert_matches!(first, WebhookOutcome::Extended { .. });
    assert_matches!(second, WebhookOutcome::AlreadyApplied { ref reference } if reference == "ref-002");
    let details = consultations.get_details("room-1").await.unwrap();
    assert_eq!(details.end_at, reference_instant() + Duration::minutes(60));
}

#[tokio::test]
async fn test_bad_signatures_are_unauthorized() {
    let config = TestConfig::default();
    let (service, consultations) = setup(&config).await;
    let app = payment_routes(service);
    let body = charge_success("ref-003", json!({"roomName": "room-1", "minutesToExtend": 15}));

    let (missing, _) = deliver(&app, &body, None).await;
    let (forged, json) = deliver(&app, &body, Some(&"ab".repeat(64))).await;
    let other_body = charge_success("ref-003", json!({"roomName": "room-1", "minutesToExtend": 60}));
    let (replayed, _) = deliver(&app, &other_body, Some(&config.sign_webhook(&body))).await;

    assert_eq!(missing, StatusCode::UNAUTHORIZED);
    assert_eq!(forged, StatusCode::UNAUTHORIZED);
    assert_eq!(replayed, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Invalid signature");
    let details = consultations.get_details("room-1").await.unwrap();
    assert_eq!(details.end_at, reference_instant() + Duration::minutes(30));
}

#[tokio::test]
async fn test_unconfigured_secret_is_server_error() {
    let mut config = TestConfig::default();
    let signer = TestConfig::default();
    config.paystack_secret_key = String::new();
    let (service, _) = setup(&config).await;
    let app = payment_routes(service);

    let body = charge_success("ref-004", json!({"roomName": "room-1", "minutesToExtend": 15}));
    let (status, json) = deliver(&app, &body, Some(&signer.sign_webhook(&body))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "payment webhook not configured");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let config = TestConfig::default();
    let (service, _) = setup(&config).await;

    let body = "{not json";
    let result = service
        .handle_delivery(body.as_bytes(), Some(&config.sign_webhook(body)))
        .await;
    assert_matches!(result, Err(PaymentWebhookError::InvalidPayload(_)));

    let app = payment_routes(service);
    let (status, _) = deliver(&app, body, Some(&config.sign_webhook(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_downstream_failures_are_still_acknowledged() {
    let config = TestConfig::default();
    let (service, _) = setup(&config).await;
    let app = payment_routes(service.clone());

    let unknown_room = charge_success("ref-005", json!({"roomName": "nowhere", "minutesToExtend": 15}));
    let (status, json) = deliver(&app, &unknown_room, Some(&config.sign_webhook(&unknown_room))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["received"], true);

    let no_metadata = charge_success("ref-006", Value::Null);
    let outcome = service
        .handle_delivery(no_metadata.as_bytes(), Some(&config.sign_webhook(&no_metadata)))
        .await
        .unwrap();
    assert_matches!(outcome, WebhookOutcome::Failed { reference: Some(_), .. });
}

#[tokio::test]
async fn test_failed_extension_can_be_retried_by_redelivery() {
    let config = TestConfig::default();
    let (service, _) = setup(&config).await;

    let body = charge_success("ref-007", json!({"roomName": "room-1", "minutesToExtend": 0}));
    let signature = config.sign_webhook(&body);

    for _ in 0..2 {
        let outcome = service.handle_delivery(body.as_bytes(), Some(&signature)).await.unwrap();
        assert_matches!(outcome, WebhookOutcome::Failed { .. });
    }
}

#[tokio::test]
async fn test_other_events_are_ignored() {
    let config = TestConfig::default();
    let (service, _) = setup(&config).await;

    let body = json!({"event": "transfer.success", "data": {"reference": "tr-1"}}).to_string();
    let outcome = service
        .handle_delivery(body.as_bytes(), Some(&config.sign_webhook(&body)))
        .await
        .unwrap();

    assert_matches!(outcome, WebhookOutcome::Ignored { ref event } if event == "transfer.success");
}

#[tokio::test]
async fn test_references_are_forgotten_after_retry_window() {
    let config = TestConfig::default();
    let (_, consultations) = setup(&config).await;
    let gateway_clock = ManualClock::new(reference_instant());
    let mut app_config = config.to_app_config();
    app_config.payment_reference_retention_seconds = 3600;
    let service = PaystackWebhookService::with_clock(
        &app_config,
        consultations.clone(),
        Arc::new(gateway_clock.clone()),
    );

    let first = charge_success("ref-100", json!({"roomName": "room-1", "minutesToExtend": 5}));
    let first_signature = config.sign_webhook(&first);
    service.handle_delivery(first.as_bytes(), Some(&first_signature)).await.unwrap();

    gateway_clock.set(reference_instant() + Duration::minutes(59));
    let repeat = service.handle_delivery(first.as_bytes(), Some(&first_signature)).await.unwrap();
    assert_matches!(repeat, WebhookOutcome::AlreadyApplied { .. });
    assert_eq!(service.tracked_references().await, 1);

    gateway_clock.set(reference_instant() + Duration::hours(2));
    let second = charge_success("ref-101", json!({"roomName": "room-1", "minutesToExtend": 5}));
    let outcome = service
        .handle_delivery(second.as_bytes(), Some(&config.sign_webhook(&second)))
        .await
        .unwrap();

    assert_matches!(outcome, WebhookOutcome::Extended { .. });
    assert_eq!(service.tracked_references().await, 1);
}
