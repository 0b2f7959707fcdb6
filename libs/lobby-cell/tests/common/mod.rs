#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::Notify;

use consultation_cell::{ConsultationService, InMemoryConsultationStore, ScheduleConsultationRequest};
use lobby_cell::{LobbyRegistry, LobbySettings};
use shared_utils::clock::ManualClock;
use shared_utils::test_utils::reference_instant;
use video_room_cell::{JoinCredential, RoomCompletion, VideoRoomController, VideoRoomError};

/// Records every call and can be told to refuse credentials, hold a
/// credential request open, or stall room completion.
#[derive(Default)]
pub struct FakeVideo {
    pub credentials_issued: Mutex<Vec<(String, String)>>,
    pub rooms_completed: Mutex<Vec<String>>,
    pub refuse_credentials: Mutex<bool>,
    pub fail_completion: Mutex<bool>,
    pub completion_delay: Mutex<Option<StdDuration>>,
    pub hold_credentials: Mutex<bool>,
    /// Signalled when a held credential request has started.
    pub credential_requested: Notify,
    /// Lets a held credential request finish.
    pub release_credential: Notify,
}

impl FakeVideo {
    pub fn completed(&self) -> Vec<String> {
        self.rooms_completed.lock().unwrap().clone()
    }

    pub fn issued(&self) -> Vec<(String, String)> {
        self.credentials_issued.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoRoomController for FakeVideo {
    async fn issue_join_credential(
        &self,
        room_name: &str,
        identity: &str,
    ) -> Result<JoinCredential, VideoRoomError> {
        let hold = *self.hold_credentials.lock().unwrap();
        if hold {
            self.credential_requested.notify_one();
            self.release_credential.notified().await;
        }
        if *self.refuse_credentials.lock().unwrap() {
            return Err(VideoRoomError::CredentialIssuance {
                message: "provider unavailable".to_string(),
            });
        }
        self.credentials_issued
            .lock()
            .unwrap()
            .push((room_name.to_string(), identity.to_string()));
        Ok(JoinCredential {
            token: format!("token-for-{}", identity),
            identity: identity.to_string(),
            room_name: room_name.to_string(),
            expires_at: reference_instant() + Duration::hours(4),
        })
    }

    async fn complete_room(&self, room_name: &str) -> Result<RoomCompletion, VideoRoomError> {
        self.rooms_completed.lock().unwrap().push(room_name.to_string());
        let delay = *self.completion_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_completion.lock().unwrap() {
            return Err(VideoRoomError::CompletionFailed {
                message: "HTTP 500".to_string(),
            });
        }
        Ok(RoomCompletion::Completed)
    }

    fn is_configured(&self) -> bool {
        true
    }
}

pub struct Harness {
    pub consultations: Arc<ConsultationService>,
    pub video: Arc<FakeVideo>,
    pub clock: ManualClock,
    pub registry: LobbyRegistry,
}

/// One consultation "Room-1" from T to T+30min with alice@example.com
/// invited; the clock starts at T+5min. The background ticker is slowed
/// right down so tests drive ticks explicitly.
pub async fn harness() -> Harness {
    harness_with_tick(StdDuration::from_secs(3600)).await
}

pub async fn harness_with_tick(tick: StdDuration) -> Harness {
    harness_with_settings(LobbySettings {
        tick_interval: tick,
        ..LobbySettings::default()
    })
    .await
}

pub async fn harness_with_settings(settings: LobbySettings) -> Harness {
    let clock = ManualClock::new(reference_instant() + Duration::minutes(5));
    let consultations = Arc::new(ConsultationService::new(
        Arc::new(InMemoryConsultationStore::new()),
        Arc::new(clock.clone()),
    ));
    consultations
        .schedule(ScheduleConsultationRequest {
            host_name: "Dr. Nkemelu".to_string(),
            room_name: "Room-1".to_string(),
            start_at: reference_instant(),
            end_at: reference_instant() + Duration::minutes(30),
            client_emails: "alice@example.com".to_string(),
        })
        .await
        .unwrap();

    let video = Arc::new(FakeVideo::default());
    let registry = LobbyRegistry::with_clock(
        consultations.clone(),
        video.clone(),
        Arc::new(clock.clone()),
        settings,
    );

    Harness {
        consultations,
        video,
        clock,
        registry,
    }
}
