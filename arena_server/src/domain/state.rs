// Player input and the per-tick snapshot types handed to the adapters.

use crate::domain::agent::Behavior;
use crate::domain::ids::EntityId;
use crate::domain::mob::Mob;
use crate::domain::player::Player;
use crate::domain::projectile::Projectile;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerInput {
    /// Movement direction; values are clamped to a unit vector.
    pub move_x: f32,
    pub move_y: f32,
    pub attack: bool,
    pub aim_x: Option<f32>,
    pub aim_y: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    /// Archetype name for mobs, display name for players.
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    pub hp: i32,
    pub max_hp: i32,
    pub alive: bool,
    pub attacking: bool,
    pub casting: bool,
    pub behavior: Behavior,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileSnapshot {
    pub id: u64,
    pub owner_id: EntityId,
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    pub deflected: bool,
}

impl From<&Mob> for EntitySnapshot {
    fn from(m: &Mob) -> Self {
        let c = &m.combatant;
        Self {
            id: c.id,
            label: m.archetype.clone(),
            x: c.x,
            y: c.y,
            heading: c.heading,
            hp: c.health,
            max_hp: c.max_health,
            alive: c.is_alive,
            attacking: c.is_attacking,
            casting: m.attack.is_casting,
            behavior: m.agent.current_behavior,
        }
    }
}

impl From<&Player> for EntitySnapshot {
    fn from(p: &Player) -> Self {
        let c = &p.combatant;
        Self {
            id: c.id,
            label: p.display_name.clone(),
            x: c.x,
            y: c.y,
            heading: c.heading,
            hp: c.health,
            max_hp: c.max_health,
            alive: c.is_alive,
            attacking: c.is_attacking,
            casting: p.attack.is_casting,
            behavior: p.agent.current_behavior,
        }
    }
}

impl From<&Projectile> for ProjectileSnapshot {
    fn from(p: &Projectile) -> Self {
        Self {
            id: p.id,
            owner_id: p.owner_id,
            x: p.x,
            y: p.y,
            heading: p.heading(),
            deflected: p.deflected_by.is_some(),
        }
    }
}
