// Minimal steering integrator standing in for a rigid-body engine.

use crate::domain::geometry::WorldBounds;
use crate::domain::ports::{BodyDesc, BodyId, BodyKind, BodyState, PhysicsWorld};
use glam::Vec2;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Body {
    desc: BodyDesc,
    position: Vec2,
    velocity: Vec2,
    desired: Vec2,
    touching_boundary: bool,
}

/// Creatures accelerate toward their desired velocity (bounded by `max_acceleration`) and
/// are clamped inside the bounds. Projectiles fly straight and stop at the first edge.
#[derive(Debug, Default)]
pub struct KinematicPhysics {
    bodies: BTreeMap<BodyId, Body>,
}

impl KinematicPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl PhysicsWorld for KinematicPhysics {
    fn create_body(&mut self, id: BodyId, desc: BodyDesc) {
        self.bodies.insert(
            id,
            Body {
                desc,
                position: desc.position,
                velocity: desc.velocity,
                desired: desc.velocity,
                touching_boundary: false,
            },
        );
    }

    fn remove_body(&mut self, id: BodyId) -> bool {
        self.bodies.remove(&id).is_some()
    }

    fn has_body(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    fn set_desired_velocity(&mut self, id: BodyId, velocity: Vec2) -> bool {
        let Some(body) = self.bodies.get_mut(&id) else {
            return false;
        };
        body.desired = velocity;
        if body.desc.kind == BodyKind::Projectile {
            body.velocity = velocity;
        }
        true
    }

    fn set_position(&mut self, id: BodyId, position: Vec2) -> bool {
        let Some(body) = self.bodies.get_mut(&id) else {
            return false;
        };
        body.position = position;
        body.touching_boundary = false;
        true
    }

    fn update(&mut self, dt: f32, bounds: &WorldBounds) {
        for body in self.bodies.values_mut() {
            match body.desc.kind {
                BodyKind::Creature => {
                    let delta = body.desired - body.velocity;
                    let max_dv = body.desc.max_acceleration * dt;
                    body.velocity += delta.clamp_length_max(max_dv);

                    let next = body.position + body.velocity * dt;
                    let clamped = bounds.clamp(next, body.desc.radius);
                    body.touching_boundary = clamped != next;
                    if clamped.x != next.x {
                        body.velocity.x = 0.0;
                    }
                    if clamped.y != next.y {
                        body.velocity.y = 0.0;
                    }
                    body.position = clamped;
                }
                BodyKind::Projectile => {
                    if body.touching_boundary {
                        continue;
                    }
                    let next = body.position + body.velocity * dt;
                    let clamped = bounds.clamp(next, 0.0);
                    if clamped != next {
                        body.touching_boundary = true;
                        body.velocity = Vec2::ZERO;
                    }
                    body.position = clamped;
                }
            }
        }
    }

    fn get_body(&self, id: BodyId) -> Option<BodyState> {
        self.bodies.get(&id).map(|b| BodyState {
            position: b.position,
            velocity: b.velocity,
            touching_boundary: b.touching_boundary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::EntityId;

    fn creature(at: Vec2) -> BodyDesc {
        BodyDesc {
            kind: BodyKind::Creature,
            position: at,
            velocity: Vec2::ZERO,
            radius: 1.0,
            max_acceleration: 10.0,
        }
    }

    #[test]
    fn when_desired_velocity_set_then_acceleration_is_bounded() {
        let mut physics = KinematicPhysics::new();
        let id = BodyId::Entity(EntityId::Mob(1));
        physics.create_body(id, creature(Vec2::new(50.0, 50.0)));
        physics.set_desired_velocity(id, Vec2::new(100.0, 0.0));

        physics.update(0.1, &WorldBounds::default());

        let body = physics.get_body(id).expect("body");
        assert!((body.velocity.x - 1.0).abs() < 1e-4);
    }

    #[test]
    fn when_creature_pushes_past_edge_then_it_stays_inside() {
        let mut physics = KinematicPhysics::new();
        let id = BodyId::Entity(EntityId::Player(1));
        physics.create_body(id, creature(Vec2::new(1.5, 50.0)));
        physics.set_desired_velocity(id, Vec2::new(-10.0, 0.0));

        for _ in 0..20 {
            physics.update(0.1, &WorldBounds::default());
        }

        let body = physics.get_body(id).expect("body");
        assert!(body.position.x >= 1.0);
        assert!(body.touching_boundary);
    }

    #[test]
    fn when_projectile_reaches_edge_then_it_stops_and_flags_contact() {
        let mut physics = KinematicPhysics::new();
        let id = BodyId::Projectile(4);
        physics.create_body(
            id,
            BodyDesc {
                kind: BodyKind::Projectile,
                position: Vec2::new(499.0, 10.0),
                velocity: Vec2::new(20.0, 0.0),
                radius: 0.5,
                max_acceleration: 0.0,
            },
        );

        physics.update(0.1, &WorldBounds::default());

        let body = physics.get_body(id).expect("body");
        assert!(body.touching_boundary);
        assert_eq!(body.velocity, Vec2::ZERO);
        assert_eq!(body.position.x, 500.0);
    }
}
