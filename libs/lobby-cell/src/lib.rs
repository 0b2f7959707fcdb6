// libs/lobby-cell/src/lib.rs
//! # Lobby Cell
//!
//! Sequences a joining participant through the consultation:
//!
//! ```text
//! EmailPrompt -> NamePrompt -> Lobby <-> InCall
//!      \______________\__________\________\____> Ended (window elapsed)
//! ```
//!
//! [`LobbySession`] is the pure state machine. [`LobbyController`] wraps it
//! with a countdown ticker and the remote calls, and [`LobbyRegistry`] keeps
//! controllers server-side for clients that only render snapshots. Sessions
//! that go quiet, or outlive their consultation by a grace period, are swept.
//!
//! ## API Endpoints
//!
//! - `POST /lobby/sessions` - Open a session for a room
//! - `GET /lobby/sessions/{id}` - Current snapshot
//! - `POST /lobby/sessions/{id}/email` - Verify email
//! - `POST /lobby/sessions/{id}/name` - Submit display name
//! - `POST /lobby/sessions/{id}/join` - Join the call
//! - `POST /lobby/sessions/{id}/leave` - Leave the call
//! - `POST /lobby/sessions/{id}/extend` - Extend the consultation
//! - `DELETE /lobby/sessions/{id}` - Tear down

pub mod controller;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod router;
pub mod state;

pub use controller::{LobbyController, LobbySettings};
pub use models::{LobbyError, LobbySnapshot};
pub use registry::LobbyRegistry;
pub use router::lobby_routes;
pub use state::{Countdown, LobbySession, LobbyStage, TickOutcome};
