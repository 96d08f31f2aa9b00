// Domain layer: core simulation types and rules.

pub mod agent;
pub mod attack;
pub mod combatant;
pub mod geometry;
pub mod ids;
pub mod mob;
pub mod player;
pub mod ports;
pub mod projectile;
pub mod state;
pub mod systems;
pub mod tuning;
pub mod world;

pub use ids::EntityId;
pub use state::{EntitySnapshot, PlayerInput, ProjectileSnapshot};
pub use world::World;
