use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use consultation_cell::{consultation_routes, ConsultationService, InMemoryConsultationStore};
use consultation_cell::handlers::NOT_INVITED_MESSAGE;

fn create_app() -> Router {
    let service = ConsultationService::with_system_clock(Arc::new(InMemoryConsultationStore::new()));
    consultation_routes(Arc::new(service))
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
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn schedule_body(room_name: &str) -> Value {
    json!({
        "hostName": "Dr. Okafor",
        "roomName": room_name,
        "startAt": "2030-06-01T10:00:00Z",
        "endAt": "2030-06-01T10:30:00Z",
        "clientEmails": "alice@example.com"
    })
}

#[tokio::test]
async fn test_create_consultation_returns_join_path() {
    let app = create_app();

    let (status, json) = send(&app, "POST", "/", Some(schedule_body("Family-Visit"))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["joinPath"], "/consult/family-visit");
    assert_eq!(json["consultation"]["normalizedRoomName"], "family-visit");
    assert_eq!(json["consultation"]["roomName"], "Family-Visit");
    assert_eq!(json["consultation"]["clients"][0]["email"], "alice@example.com");
    assert_eq!(json["consultation"]["startAt"], "2030-06-01T10:00:00Z");
}

#[tokio::test]
async fn test_create_duplicate_room_conflicts() {
    let app = create_app();

    send(&app, "POST", "/", Some(schedule_body("Family-Visit"))).await;
    let (status, json) = send(&app, "POST", "/", Some(schedule_body("family-visit"))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "Room name already exists. Please choose a unique name.");
}

#[tokio::test]
async fn test_create_with_inverted_schedule_is_bad_request() {
    let app = create_app();
    let mut body = schedule_body("room-1");
    body["endAt"] = json!("2030-06-01T09:00:00Z");

    let (status, json) = send(&app, "POST", "/", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "End time must be after start time.");
}

#[tokio::test]
async fn test_get_consultation_not_found() {
    let app = create_app();

    let (status, json) = send(&app, "GET", "/unknown-room", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Consultation not found.");
}

#[tokio::test]
async fn test_verify_then_name_flow() {
    let app = create_app();
    send(&app, "POST", "/", Some(schedule_body("Room-7"))).await;

    let (status, json) = send(&app, "POST", "/room-7/verify", Some(json!({"email": "ALICE@example.com"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert!(json["clientName"].is_null());

    let (status, _) = send(
        &app,
        "PUT",
        "/ROOM-7/clients/name",
        Some(json!({"email": "alice@example.com", "name": "Alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, "POST", "/room-7/verify", Some(json!({"email": "alice@example.com"}))).await;
    assert_eq!(json["clientName"], "Alice");
}

#[tokio::test]
async fn test_verify_does_not_reveal_which_part_is_wrong() {
    let app = create_app();
    send(&app, "POST", "/", Some(schedule_body("room-7"))).await;

    let (wrong_room, room_json) =
        send(&app, "POST", "/room-8/verify", Some(json!({"email": "alice@example.com"}))).await;
    let (wrong_email, email_json) =
        send(&app, "POST", "/room-7/verify", Some(json!({"email": "eve@example.com"}))).await;

    assert_eq!(wrong_room, StatusCode::NOT_FOUND);
    assert_eq!(wrong_email, StatusCode::NOT_FOUND);
    assert_eq!(room_json["error"], NOT_INVITED_MESSAGE);
    assert_eq!(email_json["error"], NOT_INVITED_MESSAGE);
}

#[tokio::test]
async fn test_extend_returns_new_end() {
    let app = create_app();
    send(&app, "POST", "/", Some(schedule_body("room-7"))).await;

    let (status, json) = send(&app, "POST", "/room-7/extend", Some(json!({"minutes": 15}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["newEndAt"], "2030-06-01T10:45:00Z");

    let (_, details) = send(&app, "GET", "/room-7", None).await;
    assert_eq!(details["endAt"], "2030-06-01T10:45:00Z");

    let (status, _) = send(&app, "POST", "/room-7/extend", Some(json!({"minutes": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_extension_offers_menu() {
    let app = create_app();

    let (status, json) = send(&app, "GET", "/extension-offers", None).await;

    assert_eq!(status, StatusCode::OK);
    let minutes: Vec<i64> = json["offers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["minutes"].as_i64().unwrap())
        .collect();
    assert_eq!(minutes, vec![15, 30, 60]);
}
