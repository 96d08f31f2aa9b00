// Per-room publish/subscribe bus. Subsystems publish during a stage; the room dispatches
// after the stage finishes.

use crate::domain::EntityId;
use crate::domain::combatant::StatusEffect;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    MobSpawned {
        mob_id: u64,
        archetype: String,
        x: f32,
        y: f32,
    },
    MobRemoved {
        mob_id: u64,
    },
    PlayerJoined {
        player_id: u64,
        bot_mode: bool,
    },
    PlayerLeft {
        player_id: u64,
    },
    EntityDamaged {
        target: EntityId,
        source: Option<EntityId>,
        amount: i32,
        health: i32,
    },
    EntityHealed {
        target: EntityId,
        amount: i32,
        health: i32,
    },
    EntityDied {
        target: EntityId,
        killer: Option<EntityId>,
    },
    EntityRespawned {
        target: EntityId,
        x: f32,
        y: f32,
    },
    StatusApplied {
        target: EntityId,
        status: StatusEffect,
        until: u64,
    },
    ProjectileSpawned {
        projectile_id: u64,
        owner: EntityId,
    },
    ProjectileDeflected {
        projectile_id: u64,
        by: EntityId,
    },
    ProjectileDespawned {
        projectile_id: u64,
    },
}

pub type ListenerId = u64;
pub type Listener = Box<dyn FnMut(&RoomEvent) + Send>;

#[derive(Default)]
pub struct EventBus {
    pending: Vec<RoomEvent>,
    listeners: BTreeMap<ListenerId, Listener>,
    next_listener_id: ListenerId,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("pending", &self.pending.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, event: RoomEvent) {
        self.pending.push(event);
    }

    /// Events published since the last call, in publish order.
    pub fn take_pending(&mut self) -> Vec<RoomEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Hands already-dispatched events to the external listeners, in subscription order.
    pub fn notify(&mut self, events: &[RoomEvent]) {
        for listener in self.listeners.values_mut() {
            for event in events {
                listener(event);
            }
        }
    }

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.next_listener_id += 1;
        self.listeners.insert(self.next_listener_id, listener);
        self.next_listener_id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
