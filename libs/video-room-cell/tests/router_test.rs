use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_utils::jwt::verify_hs256;
use shared_utils::test_utils::TestConfig;
use video_room_cell::models::AccessTokenClaims;
use video_room_cell::{video_room_routes, TwilioVideoClient, VideoRoomController};

fn create_app(config: &TestConfig) -> Router {
    let controller: Arc<dyn VideoRoomController> =
        Arc::new(TwilioVideoClient::new(&config.to_app_config()));
    video_room_routes(controller)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_token_endpoint_returns_signed_grant() {
    let config = TestConfig::default();
    let app = create_app(&config);

    let (status, json) = send(
        &app,
        "POST",
        "/token",
        Some(json!({"identity": "Alice", "roomName": "Family-Room"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["roomName"], "family-room");
    let token = json["token"].as_str().unwrap();
    let claims: AccessTokenClaims = verify_hs256(token, &config.twilio_api_key_secret).unwrap();
    assert_eq!(claims.grants.video.room, "family-room");
    assert_eq!(claims.grants.identity, "Alice");
}

#[tokio::test]
async fn test_token_endpoint_rejects_missing_identity() {
    let app = create_app(&TestConfig::default());

    let (status, json) = send(&app, "POST", "/token", Some(json!({"roomName": "room-1"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing identity or roomName");
}

#[tokio::test]
async fn test_complete_endpoint_reports_not_found_as_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Rooms/room-1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let app = create_app(&TestConfig::default().with_twilio_base_url(&server.uri()));

    let (status, json) =
        send(&app, "POST", "/rooms/complete", Some(json!({"roomName": "  ROOM-1 "}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Room room-1 not found or already completed.");
}

#[tokio::test]
async fn test_health_reports_configuration() {
    let app = create_app(&TestConfig::default());

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["configured"], true);
    assert_eq!(json["status"], "healthy");
}
