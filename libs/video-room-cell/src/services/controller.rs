// libs/video-room-cell/src/services/controller.rs
use async_trait::async_trait;

use crate::models::{JoinCredential, RoomCompletion, VideoRoomError};

/// The two operations the rest of the system needs from a video provider.
/// The lobby drives sessions through this trait so tests can swap in a fake.
#[async_trait]
pub trait VideoRoomController: Send + Sync {
    /// Issue a credential admitting `identity` to `room_name` only.
    async fn issue_join_credential(
        &self,
        room_name: &str,
        identity: &str,
    ) -> Result<JoinCredential, VideoRoomError>;

    /// Force-close a room. Unknown and already-completed rooms count as success.
    async fn complete_room(&self, room_name: &str) -> Result<RoomCompletion, VideoRoomError>;

    fn is_configured(&self) -> bool;
}
