// Encodes each room update once and fans the bytes out to every session of that room.

use crate::interface_adapters::protocol::{ServerMessage, WorldUpdateDto};
use crate::use_cases::{RoomHandle, WorldUpdate};

use axum::extract::ws::Utf8Bytes;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, trace, warn};

fn encode(update: WorldUpdate) -> Option<Utf8Bytes> {
    let tick = update.tick;
    let msg = ServerMessage::WorldUpdate(WorldUpdateDto::from(update));
    match serde_json::to_string(&msg) {
        Ok(txt) => Some(Utf8Bytes::from(txt)),
        Err(e) => {
            error!(tick, error = ?e, "failed to serialize world update");
            None
        }
    }
}

pub async fn world_update_serializer(
    mut world_rx: broadcast::Receiver<WorldUpdate>,
    world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    world_latest_tx: watch::Sender<Utf8Bytes>,
) {
    loop {
        let update = match world_rx.recv().await {
            Ok(update) => update,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "world serializer lagged; skipping to latest update");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("world updates channel closed; serializer exiting");
                break;
            }
        };

        // Nobody is connected; a new session starts from the next broadcast.
        if world_bytes_tx.receiver_count() == 0 {
            continue;
        }

        let tick = update.tick;
        let events = update.events.len();
        let Some(bytes) = encode(update) else {
            continue;
        };
        trace!(tick, events, bytes = bytes.len(), "world update encoded");

        // The latest copy serves sessions that fell behind the broadcast.
        world_latest_tx.send_replace(bytes.clone());
        let _ = world_bytes_tx.send(bytes);
    }
}

/// Starts the encoder for a freshly created room.
pub fn spawn_room_serializer(room: &RoomHandle) {
    tokio::spawn(world_update_serializer(
        room.world_tx.subscribe(),
        room.world_bytes_tx.clone(),
        room.world_latest_tx.clone(),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn update(tick: u64) -> WorldUpdate {
        WorldUpdate {
            tick,
            time_ms: tick * 16,
            entities: Vec::new(),
            projectiles: Vec::new(),
            events: Vec::new(),
        }
    }

    #[tokio::test]
    async fn when_update_published_then_subscribers_get_tagged_json_and_latest_is_kept() {
        let (world_tx, world_rx) = broadcast::channel(8);
        let (bytes_tx, mut bytes_rx) = broadcast::channel(8);
        let (latest_tx, latest_rx) = watch::channel(Utf8Bytes::from(""));
        tokio::spawn(world_update_serializer(world_rx, bytes_tx, latest_tx));

        world_tx.send(update(3)).expect("send");
        let bytes = tokio::time::timeout(Duration::from_secs(1), bytes_rx.recv())
            .await
            .expect("timely")
            .expect("bytes");

        let value: serde_json::Value = serde_json::from_str(bytes.as_str()).expect("json");
        assert_eq!(value["type"], "WorldUpdate");
        assert_eq!(value["data"]["tick"], 3);
        assert_eq!(latest_rx.borrow().as_str(), bytes.as_str());
    }
}
