// libs/lobby-cell/src/state.rs
use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};

use consultation_cell::Consultation;
use video_room_cell::JoinCredential;

use crate::models::LobbyError;

pub const ENDED_MESSAGE: &str = "This consultation has ended.";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LobbyStage {
    EmailPrompt,
    NamePrompt,
    Lobby,
    InCall,
    Ended,
}

/// Where `now` sits relative to the consultation window.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Countdown {
    NotStarted {
        #[serde(rename = "seconds", serialize_with = "as_seconds")]
        starts_in: Duration,
    },
    Live {
        #[serde(rename = "seconds", serialize_with = "as_seconds")]
        remaining: Duration,
    },
    Elapsed,
}

fn as_seconds<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(duration.num_seconds())
}

impl Countdown {
    /// The window is closed on both ends: joining is allowed at exactly
    /// `start_at` and at exactly `end_at`.
    pub fn at(start_at: DateTime<Utc>, end_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now > end_at {
            Countdown::Elapsed
        } else if now < start_at {
            Countdown::NotStarted {
                starts_in: start_at - now,
            }
        } else {
            Countdown::Live {
                remaining: end_at - now,
            }
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Countdown::Live { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Countdown::NotStarted { starts_in } => {
                format!("Consultation starts in {}.", human_distance(*starts_in))
            }
            Countdown::Live { remaining } => {
                format!("Consultation ends in {}.", human_distance(*remaining))
            }
            Countdown::Elapsed => ENDED_MESSAGE.to_string(),
        }
    }
}

/// Largest whole unit, rounded: "30 seconds", "5 minutes", "2 hours", "1 day".
pub fn human_distance(duration: Duration) -> String {
    let secs = duration.num_seconds().max(0);

    let (count, unit) = if secs < 60 {
        (secs, "second")
    } else if secs < 3_600 {
        ((secs + 30) / 60, "minute")
    } else if secs < 86_400 {
        ((secs + 1_800) / 3_600, "hour")
    } else {
        ((secs + 43_200) / 86_400, "day")
    };

    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

/// Result of evaluating the clock against the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Counting(Countdown),
    /// The window closed on this tick. The room needs completing if a call was live.
    Expired { was_in_call: bool },
    /// Already terminal; nothing changes.
    Finished,
}

/// One participant's path through a consultation, free of I/O. Every
/// transition is a method; the orchestrator performs the remote calls and
/// feeds their results in.
#[derive(Debug, Clone)]
pub struct LobbySession {
    stage: LobbyStage,
    consultation: Consultation,
    email: Option<String>,
    client_name: Option<String>,
    credential: Option<JoinCredential>,
    countdown: Countdown,
}

impl LobbySession {
    pub fn new(consultation: Consultation, now: DateTime<Utc>) -> Self {
        let mut session = Self {
            stage: LobbyStage::EmailPrompt,
            countdown: Countdown::at(consultation.start_at, consultation.end_at, now),
            consultation,
            email: None,
            client_name: None,
            credential: None,
        };
        if session.countdown == Countdown::Elapsed {
            session.stage = LobbyStage::Ended;
        }
        session
    }

    pub fn stage(&self) -> LobbyStage {
        self.stage
    }

    pub fn consultation(&self) -> &Consultation {
        &self.consultation
    }

    pub fn room_name(&self) -> &str {
        &self.consultation.normalized_room_name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn client_name(&self) -> Option<&str> {
        self.client_name.as_deref()
    }

    pub fn credential(&self) -> Option<&JoinCredential> {
        self.credential.as_ref()
    }

    pub fn countdown(&self) -> Countdown {
        self.countdown
    }

    pub fn can_join(&self) -> bool {
        self.stage == LobbyStage::Lobby && self.countdown.is_live()
    }

    pub fn status_message(&self) -> String {
        if self.stage == LobbyStage::Ended {
            return ENDED_MESSAGE.to_string();
        }
        self.countdown.message()
    }

    pub fn ensure_stage(&self, expected: LobbyStage, action: &'static str) -> Result<(), LobbyError> {
        if self.stage == LobbyStage::Ended {
            return Err(LobbyError::SessionEnded);
        }
        if self.stage != expected {
            return Err(LobbyError::InvalidTransition {
                from: self.stage,
                action,
            });
        }
        Ok(())
    }

    /// `EmailPrompt` → `NamePrompt`, or straight to `Lobby` for a returning client.
    pub fn email_verified(
        &mut self,
        email: String,
        stored_name: Option<String>,
    ) -> Result<LobbyStage, LobbyError> {
        self.ensure_stage(LobbyStage::EmailPrompt, "verify email")?;

        self.email = Some(email);
        self.stage = match stored_name {
            Some(name) => {
                self.client_name = Some(name);
                LobbyStage::Lobby
            }
            None => LobbyStage::NamePrompt,
        };
        Ok(self.stage)
    }

    pub fn name_submitted(&mut self, name: &str) -> Result<LobbyStage, LobbyError> {
        self.ensure_stage(LobbyStage::NamePrompt, "submit name")?;

        self.client_name = Some(name.trim().to_string());
        self.stage = LobbyStage::Lobby;
        Ok(self.stage)
    }

    /// Checks a join may start and returns the identity to request a credential for.
    pub fn begin_join(&mut self, now: DateTime<Utc>) -> Result<String, LobbyError> {
        self.ensure_stage(LobbyStage::Lobby, "join")?;

        self.countdown = Countdown::at(self.consultation.start_at, self.consultation.end_at, now);
        if !self.countdown.is_live() {
            return Err(LobbyError::NotJoinable(self.countdown.message()));
        }

        self.client_name
            .clone()
            .ok_or(LobbyError::InvalidTransition {
                from: self.stage,
                action: "join",
            })
    }

    pub fn joined(&mut self, credential: JoinCredential, now: DateTime<Utc>) -> Result<LobbyStage, LobbyError> {
        self.begin_join(now)?;

        self.credential = Some(credential);
        self.stage = LobbyStage::InCall;
        Ok(self.stage)
    }

    pub fn left(&mut self) -> Result<LobbyStage, LobbyError> {
        self.ensure_stage(LobbyStage::InCall, "leave")?;

        self.credential = None;
        self.stage = LobbyStage::Lobby;
        Ok(self.stage)
    }

    pub fn ensure_extendable(&self) -> Result<(), LobbyError> {
        match self.stage {
            LobbyStage::Lobby | LobbyStage::InCall => Ok(()),
            LobbyStage::Ended => Err(LobbyError::SessionEnded),
            other => Err(LobbyError::InvalidTransition {
                from: other,
                action: "extend",
            }),
        }
    }

    /// Replaces the cached record after a mutation so the countdown uses the new boundary.
    pub fn refresh(&mut self, consultation: Consultation, now: DateTime<Utc>) -> Result<(), LobbyError> {
        if self.stage == LobbyStage::Ended {
            return Err(LobbyError::SessionEnded);
        }
        self.consultation = consultation;
        self.countdown = Countdown::at(self.consultation.start_at, self.consultation.end_at, now);
        Ok(())
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.stage == LobbyStage::Ended {
            return TickOutcome::Finished;
        }

        self.countdown = Countdown::at(self.consultation.start_at, self.consultation.end_at, now);
        if self.countdown != Countdown::Elapsed {
            return TickOutcome::Counting(self.countdown);
        }

        let was_in_call = self.stage == LobbyStage::InCall;
        self.stage = LobbyStage::Ended;
        self.credential = None;
        TickOutcome::Expired { was_in_call }
    }
}
