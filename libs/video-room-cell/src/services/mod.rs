// libs/video-room-cell/src/services/mod.rs

pub mod controller;
pub mod twilio;

pub use controller::VideoRoomController;
pub use twilio::TwilioVideoClient;
