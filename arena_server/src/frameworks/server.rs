// Framework bootstrap for the arena server runtime.

use crate::domain::tuning::ai::AiTuning;
use crate::domain::tuning::projectile::ProjectileTuning;
use crate::frameworks::config;
use crate::interface_adapters::net::{
    create_room_handler, dispose_room_handler, list_rooms_handler, spawn_room_serializer,
    ws_handler,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::battle::BattleSettings;
use crate::use_cases::{RoomConfig, RoomRegistry, RoomSettings};

use axum::{
    Router,
    routing::{delete, get},
};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state().await?;

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/rooms", get(list_rooms_handler).post(create_room_handler))
        .route("/rooms/{room_id}", delete(dispose_room_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn room_template() -> Result<RoomConfig> {
    let projectile = ProjectileTuning::default();
    let map = config::map_config(&projectile)
        .map_err(|e| std::io::Error::other(format!("failed to load map config: {e:?}")))?;
    Ok(RoomConfig {
        map,
        ai: AiTuning {
            decision_rate_hz: config::ai_rate_hz(),
            ..AiTuning::default()
        },
        projectile,
        battle: BattleSettings {
            drain_interval_ms: config::BATTLE_DRAIN_INTERVAL_MS,
            batch_size: config::BATTLE_BATCH_SIZE,
            queue_capacity: config::BATTLE_QUEUE_CAPACITY,
        },
        seed: config::room_seed(),
        ..RoomConfig::default()
    })
}

async fn build_state() -> Result<Arc<AppState>> {
    let room = room_template()?;
    tracing::debug!(
        map = %room.map.name,
        tick_rate_hz = config::tick_rate_hz(),
        ai_rate_hz = room.ai.decision_rate_hz,
        seed = room.seed,
        "room template configured"
    );

    // This owns the set of active room tasks.
    let room_registry = Arc::new(RoomRegistry::new(RoomSettings {
        input_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
        world_broadcast_capacity: config::WORLD_BROADCAST_CAPACITY,
        tick_interval: config::tick_interval(),
        room,
    }));

    // A room that cannot initialize is fatal for startup.
    let default_room = room_registry
        .create_room(config::DEFAULT_ROOM_ID.to_string(), None)
        .await
        .map_err(|e| std::io::Error::other(format!("default room failed to start: {e:?}")))?;
    spawn_room_serializer(&default_room);

    Ok(Arc::new(AppState {
        room_registry,
        default_room_id: Arc::from(config::DEFAULT_ROOM_ID),
    }))
}
