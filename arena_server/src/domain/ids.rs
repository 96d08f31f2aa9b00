// Room-scoped entity identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a combat entity inside one room.
///
/// Players and mobs live in separate id spaces, so the kind is part of the id. Ordering sorts
/// all players before all mobs and by raw id within a kind, which keeps iteration stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityId {
    Player(u64),
    Mob(u64),
}

impl EntityId {
    pub fn raw(self) -> u64 {
        match self {
            EntityId::Player(id) | EntityId::Mob(id) => id,
        }
    }

    pub fn is_player(self) -> bool {
        matches!(self, EntityId::Player(_))
    }

    pub fn is_mob(self) -> bool {
        matches!(self, EntityId::Mob(_))
    }

    /// Mobs fight players and players fight mobs.
    pub fn opposes(self, other: EntityId) -> bool {
        self.is_player() != other.is_player()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Player(id) => write!(f, "player:{id}"),
            EntityId::Mob(id) => write!(f, "mob:{id}"),
        }
    }
}
