// Gameplay tuning, kept separate from runtime/server configuration.

pub mod ai;
pub mod mob;
pub mod player;
pub mod projectile;
