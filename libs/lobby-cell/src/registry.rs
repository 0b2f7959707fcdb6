// libs/lobby-cell/src/registry.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info};
use uuid::Uuid;

use consultation_cell::ConsultationService;
use shared_config::AppConfig;
use shared_utils::clock::{Clock, SystemClock};
use video_room_cell::VideoRoomController;

use crate::controller::{LobbyController, LobbySettings};
use crate::models::LobbyError;

/// Server-side home for lobby sessions, keyed by an opaque id handed to the client.
#[derive(Clone)]
pub struct LobbyRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, LobbyController>>>,
    consultations: Arc<ConsultationService>,
    video: Arc<dyn VideoRoomController>,
    clock: Arc<dyn Clock>,
    settings: LobbySettings,
    reaper: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl LobbyRegistry {
    pub fn new(
        config: &AppConfig,
        consultations: Arc<ConsultationService>,
        video: Arc<dyn VideoRoomController>,
    ) -> Self {
        Self::with_clock(
            consultations,
            video,
            Arc::new(SystemClock),
            LobbySettings::from_config(config),
        )
    }

    pub fn with_clock(
        consultations: Arc<ConsultationService>,
        video: Arc<dyn VideoRoomController>,
        clock: Arc<dyn Clock>,
        settings: LobbySettings,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            consultations,
            video,
            clock,
            settings,
            reaper: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn open(&self, room_name: &str) -> Result<LobbyController, LobbyError> {
        let controller = LobbyController::open(
            room_name,
            self.consultations.clone(),
            self.video.clone(),
            self.clock.clone(),
            self.settings,
        )
        .await?;

        self.sessions
            .write()
            .await
            .insert(controller.id(), controller.clone());
        Ok(controller)
    }

    pub async fn get(&self, id: Uuid) -> Result<LobbyController, LobbyError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(LobbyError::SessionNotFound)
    }

    /// Tears a session down and stops its ticker.
    pub async fn close(&self, id: Uuid) -> Result<(), LobbyError> {
        let controller = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(LobbyError::SessionNotFound)?;

        controller.shutdown().await;
        info!("Closed lobby {}", id);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Removes sessions whose client went quiet or whose consultation ended
    /// past the grace period, stopping their tickers. Returns how many went.
    pub async fn sweep(&self) -> usize {
        let candidates: Vec<(Uuid, LobbyController)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, c)| (*id, c.clone()))
            .collect();

        let mut abandoned = Vec::new();
        for (id, controller) in candidates {
            if controller
                .is_abandoned(self.settings.idle_ttl, self.settings.ended_grace)
                .await
            {
                abandoned.push(id);
            }
        }
        if abandoned.is_empty() {
            return 0;
        }

        let removed: Vec<LobbyController> = {
            let mut sessions = self.sessions.write().await;
            abandoned.iter().filter_map(|id| sessions.remove(id)).collect()
        };
        for controller in &removed {
            controller.shutdown().await;
        }
        info!("Swept {} abandoned lobby sessions", removed.len());
        removed.len()
    }

    /// Starts the periodic sweep. Calling it again restarts the task.
    pub async fn spawn_reaper(&self) {
        let mut reaper_guard = self.reaper.lock().await;
        if let Some(handle) = reaper_guard.take() {
            handle.abort();
        }

        let registry = self.clone();
        let sweep_interval = self.settings.sweep_interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(sweep_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let removed = registry.sweep().await;
                debug!("Lobby sweep removed {} sessions", removed);
            }
        });

        *reaper_guard = Some(handle);
    }

    pub async fn is_reaping(&self) -> bool {
        self.reaper
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the sweep and every ticker; used on server shutdown.
    pub async fn shutdown_all(&self) {
        if let Some(handle) = self.reaper.lock().await.take() {
            handle.abort();
        }

        let controllers: Vec<LobbyController> =
            self.sessions.write().await.drain().map(|(_, c)| c).collect();
        for controller in &controllers {
            controller.shutdown().await;
        }
        info!("Shut down {} lobby sessions", controllers.len());
    }
}
