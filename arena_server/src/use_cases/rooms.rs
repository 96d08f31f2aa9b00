// Room registry: creates rooms with their tasks and channels, and tears them down on dispose.

use crate::use_cases::game::room_task;
use crate::use_cases::lifecycle::MapConfig;
use crate::use_cases::room::{Room, RoomConfig, RoomError};
use crate::use_cases::{GameEvent, RoomStatus, WorldUpdate};
use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, RwLock, broadcast, mpsc, watch};
use tracing::{error, info};

/// Shared configuration for spawning rooms.
#[derive(Debug, Clone)]
pub struct RoomSettings {
    /// Capacity for inbound player events.
    pub input_channel_capacity: usize,
    /// Capacity for broadcast world updates.
    pub world_broadcast_capacity: usize,
    /// Fixed tick interval for the room loop.
    pub tick_interval: Duration,
    /// Template for new rooms. A request may replace the map; every room gets its own seed.
    pub room: RoomConfig,
}

/// Per-room channels.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    /// Identifier clients use to target this room.
    pub room_id: Arc<str>,
    /// Sender for game events into the room task.
    pub input_tx: mpsc::Sender<GameEvent>,
    /// Broadcast sender for raw world updates.
    pub world_tx: broadcast::Sender<WorldUpdate>,
    /// Broadcast sender for serialized world updates.
    pub world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Watch sender holding the latest serialized world update.
    pub world_latest_tx: watch::Sender<Utf8Bytes>,
    /// Watch sender for room status changes.
    pub status_tx: watch::Sender<RoomStatus>,
    shutdown: Arc<Notify>,
}

/// Thread-safe registry for active rooms.
#[derive(Debug)]
pub struct RoomRegistry {
    settings: RoomSettings,
    rooms: RwLock<HashMap<String, RoomHandle>>,
    created: AtomicU64,
}

impl RoomRegistry {
    pub fn new(settings: RoomSettings) -> Self {
        Self {
            settings,
            rooms: RwLock::new(HashMap::new()),
            created: AtomicU64::new(0),
        }
    }

    /// Builds the room and spawns its task. An invalid map never gets a task.
    pub async fn create_room(
        &self,
        room_id: String,
        map: Option<MapConfig>,
    ) -> Result<RoomHandle, RoomError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&room_id) {
            return Err(RoomError::AlreadyExists(room_id));
        }

        let mut config = self.settings.room.clone();
        if let Some(map) = map {
            config.map = map;
        }
        let n = self.created.fetch_add(1, Ordering::Relaxed);
        config.seed = config.seed.wrapping_add(n);

        let room = Room::new(room_id.clone(), config).inspect_err(|e| {
            error!(room_id = %room_id, error = ?e, "room initialization failed");
        })?;

        // Channel wiring for the room loop.
        let (input_tx, input_rx) = mpsc::channel::<GameEvent>(self.settings.input_channel_capacity);
        let (world_tx, _world_rx) =
            broadcast::channel::<WorldUpdate>(self.settings.world_broadcast_capacity);
        let (world_bytes_tx, _world_bytes_rx) =
            broadcast::channel::<Utf8Bytes>(self.settings.world_broadcast_capacity);
        let (world_latest_tx, _world_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
        let (status_tx, _status_rx) = watch::channel::<RoomStatus>(RoomStatus::Starting);
        let shutdown = Arc::new(Notify::new());

        tokio::spawn(room_task(
            room,
            input_rx,
            world_tx.clone(),
            status_tx.clone(),
            self.settings.tick_interval,
            shutdown.clone(),
        ));

        let handle = RoomHandle {
            room_id: Arc::from(room_id.as_str()),
            input_tx,
            world_tx,
            world_bytes_tx,
            world_latest_tx,
            status_tx,
            shutdown,
        };
        rooms.insert(room_id.clone(), handle.clone());
        info!(room_id = %room_id, rooms = rooms.len(), "room created");
        Ok(handle)
    }

    pub async fn get_room(&self, room_id: &str) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).cloned()
    }

    /// Signals the room task to stop and forgets the room.
    pub async fn dispose_room(&self, room_id: &str) -> Result<(), RoomError> {
        let mut rooms = self.rooms.write().await;
        let Some(handle) = rooms.remove(room_id) else {
            return Err(RoomError::NotFound(room_id.to_string()));
        };
        // `notify_one` keeps a permit if the task is between ticks.
        handle.shutdown.notify_one();
        info!(room_id, rooms = rooms.len(), "room disposed");
        Ok(())
    }

    pub async fn room_ids(&self) -> Vec<String> {
        let rooms = self.rooms.read().await;
        let mut ids: Vec<String> = rooms.keys().cloned().collect();
        ids.sort();
        ids
    }
}
