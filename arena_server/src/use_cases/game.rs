use super::room::Room;
use super::types::{GameEvent, RoomStatus, WorldUpdate};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// `tokio::time::interval` rejects a zero period.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Drives one room at a fixed rate until `shutdown` fires.
pub async fn room_task(
    mut room: Room,
    mut input_rx: mpsc::Receiver<GameEvent>,
    world_tx: broadcast::Sender<WorldUpdate>,
    status_tx: watch::Sender<RoomStatus>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    let room_id: Arc<str> = Arc::from(room.room_id());
    let started = Instant::now();

    let tick_interval = tick_interval.max(MIN_TICK_INTERVAL);
    // Skip missed ticks instead of bursting to catch up after a stall.
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let _ = status_tx.send(RoomStatus::Running);
    info!(room_id = %room_id, tick_ms = tick_interval.as_millis() as u64, "room running");

    let mut inputs_closed = false;
    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                // Exit cleanly when the room is disposed.
                break;
            }
            _ = interval.tick() => {}
        }

        let now = started.elapsed().as_millis() as u64;
        let result = catch_unwind(AssertUnwindSafe(|| {
            if !inputs_closed {
                loop {
                    match input_rx.try_recv() {
                        Ok(ev) => room.handle_event(ev, now),
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            inputs_closed = true;
                            break;
                        }
                    }
                }
            }
            let report = room.tick(now);
            room.world_update(report)
        }));

        match result {
            Ok(update) => {
                // No subscribers is fine; updates are simply dropped.
                let _ = world_tx.send(update);
            }
            Err(_) => {
                // The panic hook already logged the payload and backtrace.
                error!(room_id = %room_id, now, "room tick panicked; continuing");
            }
        }

        if inputs_closed && world_tx.receiver_count() == 0 {
            warn!(room_id = %room_id, "room inputs closed with no listeners; stopping");
            break;
        }
    }

    room.stop();
    let _ = status_tx.send(RoomStatus::Stopped);
    info!(room_id = %room_id, "room task exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::room::RoomConfig;

    #[tokio::test]
    async fn when_tick_interval_is_zero_then_room_still_ticks_and_stops_on_shutdown() {
        let room = Room::new("zero", RoomConfig::default()).expect("room");
        let (_input_tx, input_rx) = mpsc::channel(8);
        let (world_tx, mut world_rx) = broadcast::channel(8);
        let (status_tx, status_rx) = watch::channel(RoomStatus::Starting);
        let shutdown = Arc::new(Notify::new());

        let task = tokio::spawn(room_task(
            room,
            input_rx,
            world_tx,
            status_tx,
            Duration::ZERO,
            shutdown.clone(),
        ));

        let update = tokio::time::timeout(Duration::from_secs(1), world_rx.recv())
            .await
            .expect("timely")
            .expect("update");
        assert_eq!(update.tick, 1);

        shutdown.notify_one();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("task exits")
            .expect("no panic");
        assert_eq!(*status_rx.borrow(), RoomStatus::Stopped);
    }
}
