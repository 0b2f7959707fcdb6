use std::sync::Arc;

use axum::{routing::get, Router};
use tracing::{info, warn};

use consultation_cell::{
    consultation_routes, ConsultationService, ConsultationStore, InMemoryConsultationStore,
    SupabaseConsultationStore,
};
use lobby_cell::{lobby_routes, LobbyRegistry};
use payment_cell::{payment_routes, PaystackWebhookService};
use shared_config::{AppConfig, StoreBackend};
use video_room_cell::{video_room_routes, TwilioVideoClient, VideoRoomController};

/// Long-lived services shared by every request.
pub struct AppServices {
    pub consultations: Arc<ConsultationService>,
    pub video: Arc<dyn VideoRoomController>,
    pub payments: Arc<PaystackWebhookService>,
    pub lobby: LobbyRegistry,
}

impl AppServices {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_store(config, build_store(config))
    }

    pub fn with_store(config: &AppConfig, store: Arc<dyn ConsultationStore>) -> Self {
        let consultations = Arc::new(ConsultationService::with_system_clock(store));
        let video: Arc<dyn VideoRoomController> = Arc::new(TwilioVideoClient::new(config));
        let payments = Arc::new(PaystackWebhookService::new(config, consultations.clone()));
        let lobby = LobbyRegistry::new(config, consultations.clone(), video.clone());

        Self {
            consultations,
            video,
            payments,
            lobby,
        }
    }
}

pub fn build_store(config: &AppConfig) -> Arc<dyn ConsultationStore> {
    match config.consultation_store {
        StoreBackend::Supabase if config.is_store_configured() => {
            info!("Using Supabase consultation store");
            Arc::new(SupabaseConsultationStore::new(config))
        }
        StoreBackend::Supabase => {
            warn!("Supabase store selected but not configured; falling back to in-memory store");
            Arc::new(InMemoryConsultationStore::new())
        }
        StoreBackend::Memory => {
            info!("Using in-memory consultation store");
            Arc::new(InMemoryConsultationStore::new())
        }
    }
}

pub fn create_router(services: &AppServices) -> Router {
    Router::new()
        .route("/", get(|| async { "Telehealth consultation API is running!" }))
        .nest("/consultations", consultation_routes(services.consultations.clone()))
        .nest("/video", video_room_routes(services.video.clone()))
        .nest("/payments", payment_routes(services.payments.clone()))
        .nest("/lobby", lobby_routes(services.lobby.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use shared_utils::test_utils::TestConfig;
    use tower::ServiceExt;

    fn app(config: &TestConfig) -> Router {
        let services = AppServices::with_store(
            &config.to_app_config(),
            Arc::new(InMemoryConsultationStore::new()),
        );
        create_router(&services)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn paid_extension_reaches_the_consultation() {
        let config = TestConfig::default();
        let app = app(&config);

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/consultations",
                json!({
                    "hostName": "Dr. Ameh",
                    "roomName": "Evening-Review",
                    "startAt": "2030-01-01T18:00:00Z",
                    "endAt": "2030-01-01T18:30:00Z",
                    "clientEmails": "alice@example.com"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let webhook = json!({
            "event": "charge.success",
            "data": {
                "reference": "ref-api-1",
                "metadata": {"roomName": "evening-review", "minutesToExtend": 30}
            }
        })
        .to_string();
        let request = Request::builder()
            .method("POST")
            .uri("/payments/paystack/webhook")
            .header("content-type", "application/json")
            .header("x-paystack-signature", config.sign_webhook(&webhook))
            .body(Body::from(webhook))
            .unwrap();
        let (status, ack) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack["received"], true);

        let request = Request::builder()
            .uri("/consultations/EVENING-REVIEW")
            .body(Body::empty())
            .unwrap();
        let (_, details) = send(&app, request).await;
        assert_eq!(details["endAt"], "2030-01-01T19:00:00Z");
    }

    #[tokio::test]
    async fn every_cell_is_mounted() {
        let app = app(&TestConfig::default());

        let (status, health) = send(
            &app,
            Request::builder().uri("/video/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["configured"], true);

        let (status, _) = send(
            &app,
            Request::builder()
                .uri("/consultations/extension-offers")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, json_request("POST", "/lobby/sessions", json!({"roomName": "nope"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
