// libs/video-room-cell/src/lib.rs
//! # Video Room Cell
//!
//! Thin wrapper over the hosted video provider (Twilio Video).
//!
//! - Join credentials are signed locally as short-lived access tokens
//!   granting one identity access to one room.
//! - Completing a room is a REST call; rooms that are gone or already
//!   completed are treated as success so callers can retry freely.
//!
//! ## API Endpoints
//!
//! - `POST /video/token` - Issue a join credential
//! - `POST /video/rooms/complete` - Force-complete a room
//! - `GET /video/health` - Provider configuration status

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{JoinCredential, RoomCompletion, VideoRoomError};
pub use router::video_room_routes;
pub use services::{TwilioVideoClient, VideoRoomController};
