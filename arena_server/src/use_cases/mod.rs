// Use cases layer: room orchestration and the subsystems it drives.

pub mod ai;
pub mod battle;
pub mod events;
pub mod game;
pub mod lifecycle;
pub mod room;
pub mod rooms;
pub mod timers;
pub mod types;

pub use lifecycle::{MapConfig, MapConfigError};
pub use room::{InitError, Room, RoomConfig, RoomError, SimError, Stage, TickReport};
pub use rooms::{RoomHandle, RoomRegistry, RoomSettings};
pub use types::{GameEvent, RoomStatus, WorldUpdate};
