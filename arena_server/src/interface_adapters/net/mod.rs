// Network adapters: player WebSocket sessions and the internal room-management routes.

mod handshake;
pub mod internal;
pub mod serializer;
pub mod session;

pub use internal::{create_room_handler, dispose_room_handler, list_rooms_handler};
pub use serializer::spawn_room_serializer;
pub use session::ws_handler;
