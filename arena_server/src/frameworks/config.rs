use crate::domain::tuning::projectile::ProjectileTuning;
use crate::use_cases::{MapConfig, MapConfigError};
use std::path::{Path, PathBuf};
use std::{env, fs, io, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("ARENA_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

/// Rates are counted in whole milliseconds, so nothing runs faster than once per ms.
pub const MAX_RATE_HZ: u32 = 1000;

fn parse_rate(raw: Option<String>, default: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|hz| *hz > 0)
        .unwrap_or(default)
        .min(MAX_RATE_HZ)
}

fn rate_interval(hz: u32) -> Duration {
    Duration::from_millis(1000 / u64::from(hz.clamp(1, MAX_RATE_HZ)))
}

pub fn tick_rate_hz() -> u32 {
    parse_rate(env::var("TICK_RATE_HZ").ok(), 60)
}

pub fn tick_interval() -> Duration {
    rate_interval(tick_rate_hz())
}

/// AI decision passes per second; runs independently of the tick rate.
pub fn ai_rate_hz() -> u32 {
    parse_rate(env::var("AI_RATE_HZ").ok(), 20)
}

pub fn map_config_path() -> Option<PathBuf> {
    env::var("MAP_CONFIG_PATH")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// Fixed RNG seed for reproducible rooms; otherwise derived from the clock.
pub fn room_seed() -> u64 {
    env::var("ROOM_SEED")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos() as u64
        })
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;

pub const BATTLE_QUEUE_CAPACITY: usize = 1024;
pub const BATTLE_BATCH_SIZE: usize = 256;
pub const BATTLE_DRAIN_INTERVAL_MS: u64 = 100;

pub const DEFAULT_ROOM_ID: &str = "default";

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, io::Error),
    Parse(PathBuf, toml::de::Error),
    Invalid(PathBuf, MapConfigError),
}

/// Reads and validates a map from TOML.
pub fn load_map_config(path: &Path, tuning: &ProjectileTuning) -> Result<MapConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    let map: MapConfig =
        toml::from_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
    map.validate(tuning)
        .map_err(|e| ConfigError::Invalid(path.to_path_buf(), e))?;
    Ok(map)
}

/// The configured map, or the built-in one when `MAP_CONFIG_PATH` is unset.
pub fn map_config(tuning: &ProjectileTuning) -> Result<MapConfig, ConfigError> {
    match map_config_path() {
        Some(path) => load_map_config(&path, tuning),
        None => Ok(MapConfig::default()),
    }
}
