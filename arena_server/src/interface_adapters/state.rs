use crate::use_cases::RoomRegistry;
use std::sync::Arc;

/// Shared state handed to every HTTP/WebSocket handler.
#[derive(Debug, Clone)]
pub struct AppState {
    // Owns every running room and its channels.
    pub room_registry: Arc<RoomRegistry>,
    // Room used when a client does not name one.
    pub default_room_id: Arc<str>,
}
