// Use-case level inputs/outputs for the room loop.

use crate::domain::{EntitySnapshot, PlayerInput, ProjectileSnapshot};
use crate::use_cases::events::RoomEvent;

#[derive(Debug, Clone)]
pub enum GameEvent {
    Join {
        player_id: u64,
        display_name: String,
        bot_mode: bool,
    },
    Leave {
        player_id: u64,
    },
    Input {
        player_id: u64,
        input: PlayerInput,
    },
    SetBotMode {
        player_id: u64,
        enabled: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Starting,
    Running,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct WorldUpdate {
    pub tick: u64,
    /// Room time in milliseconds.
    pub time_ms: u64,
    pub entities: Vec<EntitySnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub events: Vec<RoomEvent>,
}
