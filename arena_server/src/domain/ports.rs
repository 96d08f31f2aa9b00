// Collaborators the simulation talks to but does not own.

use crate::domain::combatant::TargetInfo;
use crate::domain::geometry::WorldBounds;
use crate::domain::ids::EntityId;
use crate::domain::world::World;
use glam::Vec2;

/// Physics handle. Creatures and projectiles share one body namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BodyId {
    Entity(EntityId),
    Projectile(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Steered toward a desired velocity and kept inside the bounds.
    Creature,
    /// Moves at its current velocity and stops at the bounds.
    Projectile,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    /// Steering acceleration limit in units per second squared.
    pub max_acceleration: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub touching_boundary: bool,
}

/// The simulation supplies desired velocities and reads back positions.
pub trait PhysicsWorld: Send {
    fn create_body(&mut self, id: BodyId, desc: BodyDesc);
    fn remove_body(&mut self, id: BodyId) -> bool;
    fn has_body(&self, id: BodyId) -> bool;
    fn set_desired_velocity(&mut self, id: BodyId, velocity: Vec2) -> bool;
    fn set_position(&mut self, id: BodyId, position: Vec2) -> bool;
    fn update(&mut self, dt: f32, bounds: &WorldBounds);
    fn get_body(&self, id: BodyId) -> Option<BodyState>;
}

/// What an agent can see when it makes a decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerceptionSnapshot {
    pub nearest_opposing: Option<TargetInfo>,
    pub distance: Option<f32>,
    /// The agent is within the boundary buffer of at least one edge.
    pub near_boundary: bool,
    pub bounds: WorldBounds,
}

/// World-query collaborator for the AI module.
pub trait Perception: Send {
    /// `None` when the agent no longer exists.
    fn query(
        &self,
        world: &World,
        agent: EntityId,
        range: f32,
        boundary_buffer: f32,
    ) -> Option<PerceptionSnapshot>;
}
