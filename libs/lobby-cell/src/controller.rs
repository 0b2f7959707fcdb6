// libs/lobby-cell/src/controller.rs
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::{
    sync::{Mutex, MutexGuard},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use consultation_cell::ConsultationService;
use shared_config::{
    AppConfig, DEFAULT_LOBBY_ENDED_GRACE_SECONDS, DEFAULT_LOBBY_IDLE_TTL_SECONDS,
    DEFAULT_LOBBY_SWEEP_SECONDS, DEFAULT_LOBBY_TICK_MILLIS, DEFAULT_ROOM_COMPLETION_TIMEOUT_MILLIS,
};
use shared_utils::clock::Clock;
use video_room_cell::VideoRoomController;

use crate::models::{LobbyError, LobbySnapshot};
use crate::state::{LobbySession, LobbyStage, TickOutcome};

/// Timing knobs for lobby sessions.
#[derive(Debug, Clone, Copy)]
pub struct LobbySettings {
    pub tick_interval: Duration,
    /// A session nobody has read or acted on for this long is torn down.
    pub idle_ttl: Duration,
    /// How long a session is kept after the consultation ended.
    pub ended_grace: Duration,
    pub sweep_interval: Duration,
    pub completion_timeout: Duration,
}

impl LobbySettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.lobby_tick_millis),
            idle_ttl: Duration::from_secs(config.lobby_idle_ttl_seconds),
            ended_grace: Duration::from_secs(config.lobby_ended_grace_seconds),
            sweep_interval: Duration::from_secs(config.lobby_sweep_seconds),
            completion_timeout: Duration::from_millis(config.room_completion_timeout_millis),
        }
    }
}

impl Default for LobbySettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(DEFAULT_LOBBY_TICK_MILLIS),
            idle_ttl: Duration::from_secs(DEFAULT_LOBBY_IDLE_TTL_SECONDS),
            ended_grace: Duration::from_secs(DEFAULT_LOBBY_ENDED_GRACE_SECONDS),
            sweep_interval: Duration::from_secs(DEFAULT_LOBBY_SWEEP_SECONDS),
            completion_timeout: Duration::from_millis(DEFAULT_ROOM_COMPLETION_TIMEOUT_MILLIS),
        }
    }
}

fn exceeds(elapsed: chrono::Duration, limit: Duration) -> bool {
    elapsed
        .to_std()
        .map(|elapsed| elapsed > limit)
        .unwrap_or(false)
}

struct LobbyShared {
    id: Uuid,
    session: Mutex<LobbySession>,
    consultations: Arc<ConsultationService>,
    video: Arc<dyn VideoRoomController>,
    clock: Arc<dyn Clock>,
    completion_timeout: Duration,
    /// Unix millis of the last snapshot or action.
    last_seen_millis: AtomicI64,
}

impl LobbyShared {
    fn touch(&self) {
        self.last_seen_millis
            .store(self.clock.now().timestamp_millis(), Ordering::Relaxed);
    }

    fn last_seen(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_seen_millis.load(Ordering::Relaxed))
            .unwrap_or_else(|| self.clock.now())
    }

    async fn tick(&self) -> LobbyStage {
        let mut session = self.session.lock().await;

        match session.tick(self.clock.now()) {
            TickOutcome::Expired { was_in_call: true } => {
                let room_name = session.room_name().to_string();
                info!("Lobby {} expired during a call; completing room {}", self.id, room_name);
                // Best-effort: the session ends whatever the provider says.
                let completion =
                    time::timeout(self.completion_timeout, self.video.complete_room(&room_name)).await;
                match completion {
                    Ok(Ok(completion)) => debug!("{}", completion.message(&room_name)),
                    Ok(Err(e)) => warn!("Failed to complete room {} on expiry: {}", room_name, e),
                    Err(_) => warn!(
                        "Completing room {} timed out after {:?}",
                        room_name, self.completion_timeout
                    ),
                }
            }
            TickOutcome::Expired { was_in_call: false } => {
                info!("Lobby {} expired", self.id);
            }
            TickOutcome::Counting(_) | TickOutcome::Finished => {}
        }

        session.stage()
    }

    async fn snapshot(&self) -> LobbySnapshot {
        self.touch();
        let session = self.session.lock().await;
        LobbySnapshot::capture(self.id, &session)
    }
}

/// Drives one participant's lobby session: serialises user actions and the
/// countdown ticker against the same state, and calls out to the
/// consultation and video services.
#[derive(Clone)]
pub struct LobbyController {
    shared: Arc<LobbyShared>,
    action_gate: Arc<Mutex<()>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
}

impl std::fmt::Debug for LobbyController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LobbyController")
            .field("tick_interval", &self.tick_interval)
            .finish_non_exhaustive()
    }
}

impl LobbyController {
    /// Loads the consultation and starts the countdown ticker.
    pub async fn open(
        room_name: &str,
        consultations: Arc<ConsultationService>,
        video: Arc<dyn VideoRoomController>,
        clock: Arc<dyn Clock>,
        settings: LobbySettings,
    ) -> Result<Self, LobbyError> {
        let consultation = consultations.get_details(room_name).await?;
        let now = clock.now();
        let session = LobbySession::new(consultation, now);

        let controller = Self {
            shared: Arc::new(LobbyShared {
                id: Uuid::new_v4(),
                session: Mutex::new(session),
                consultations,
                video,
                clock,
                completion_timeout: settings.completion_timeout,
                last_seen_millis: AtomicI64::new(now.timestamp_millis()),
            }),
            action_gate: Arc::new(Mutex::new(())),
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: settings.tick_interval.max(Duration::from_millis(1)),
        };

        controller.spawn_ticker().await;
        info!("Opened lobby {} for room {}", controller.id(), room_name);
        Ok(controller)
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub async fn snapshot(&self) -> LobbySnapshot {
        self.shared.snapshot().await
    }

    pub async fn stage(&self) -> LobbyStage {
        self.shared.session.lock().await.stage()
    }

    /// Evaluates the clock once, exactly as the background ticker does.
    pub async fn tick(&self) -> LobbyStage {
        self.shared.tick().await
    }

    fn begin_action(&self) -> Result<MutexGuard<'_, ()>, LobbyError> {
        self.shared.touch();
        self.action_gate
            .try_lock()
            .map_err(|_| LobbyError::ActionInFlight)
    }

    /// True once the client has gone quiet for `idle_ttl`, or the
    /// consultation ended more than `ended_grace` ago.
    pub async fn is_abandoned(&self, idle_ttl: Duration, ended_grace: Duration) -> bool {
        let now = self.shared.clock.now();
        if exceeds(now - self.shared.last_seen(), idle_ttl) {
            return true;
        }
        let end_at = self.shared.session.lock().await.consultation().end_at;
        exceeds(now - end_at, ended_grace)
    }

    #[instrument(skip(self), fields(lobby = %self.id()))]
    pub async fn submit_email(&self, email: &str) -> Result<LobbySnapshot, LobbyError> {
        let _action = self.begin_action()?;

        let room_name = {
            let session = self.shared.session.lock().await;
            session.ensure_stage(LobbyStage::EmailPrompt, "verify email")?;
            session.room_name().to_string()
        };

        let verified = self
            .shared
            .consultations
            .verify_client_email(&room_name, email)
            .await?;

        let mut session = self.shared.session.lock().await;
        session.email_verified(verified.email, verified.client_name)?;
        Ok(LobbySnapshot::capture(self.id(), &session))
    }

    #[instrument(skip(self), fields(lobby = %self.id()))]
    pub async fn submit_name(&self, name: &str) -> Result<LobbySnapshot, LobbyError> {
        let _action = self.begin_action()?;

        let (room_name, email) = {
            let session = self.shared.session.lock().await;
            session.ensure_stage(LobbyStage::NamePrompt, "submit name")?;
            (
                session.room_name().to_string(),
                session.email().unwrap_or_default().to_string(),
            )
        };

        self.shared
            .consultations
            .set_client_name(&room_name, &email, name)
            .await?;

        let mut session = self.shared.session.lock().await;
        session.name_submitted(name)?;
        Ok(LobbySnapshot::capture(self.id(), &session))
    }

    /// Requests a credential and enters the call. On failure the session stays in `Lobby`.
    #[instrument(skip(self), fields(lobby = %self.id()))]
    pub async fn join(&self) -> Result<LobbySnapshot, LobbyError> {
        let _action = self.begin_action()?;

        let (room_name, identity) = {
            let mut session = self.shared.session.lock().await;
            let identity = session.begin_join(self.shared.clock.now())?;
            (session.room_name().to_string(), identity)
        };

        let credential = self
            .shared
            .video
            .issue_join_credential(&room_name, &identity)
            .await
            .map_err(|e| {
                warn!("Could not issue join credential for {}: {}", identity, e);
                e
            })?;

        let mut session = self.shared.session.lock().await;
        session.joined(credential, self.shared.clock.now())?;
        info!("{} joined room {}", identity, room_name);
        Ok(LobbySnapshot::capture(self.id(), &session))
    }

    pub async fn leave(&self) -> Result<LobbySnapshot, LobbyError> {
        let _action = self.begin_action()?;

        let mut session = self.shared.session.lock().await;
        session.left()?;
        Ok(LobbySnapshot::capture(self.id(), &session))
    }

    /// Extends the consultation, then re-fetches it so the countdown uses the new end.
    #[instrument(skip(self), fields(lobby = %self.id()))]
    pub async fn extend(&self, minutes: i64) -> Result<LobbySnapshot, LobbyError> {
        let _action = self.begin_action()?;

        let room_name = {
            let session = self.shared.session.lock().await;
            session.ensure_extendable()?;
            session.room_name().to_string()
        };

        let consultations = &self.shared.consultations;
        consultations.extend(&room_name, minutes).await?;
        let refreshed = consultations.get_details(&room_name).await?;

        let mut session = self.shared.session.lock().await;
        session.refresh(refreshed, self.shared.clock.now())?;
        Ok(LobbySnapshot::capture(self.id(), &session))
    }

    /// Stops the ticker. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.cancel_ticker().await;
        debug!("Lobby {} shut down", self.id());
    }

    pub async fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let shared = self.shared.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if shared.tick().await == LobbyStage::Ended {
                    debug!("Lobby {} reached Ended; ticker stopping", shared.id);
                    break;
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}
