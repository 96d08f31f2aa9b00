use crate::domain::ids::EntityId;
use crate::domain::ports::{BodyId, PhysicsWorld};
use crate::domain::projectile::Projectile;
use crate::domain::tuning::projectile::ProjectileTuning;
use crate::domain::world::World;
use tracing::debug;

/// What happened to projectiles during one advance step. Damage is not applied here;
/// the room turns hits into battle actions.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectileOutcome {
    Hit {
        projectile_id: u64,
        owner: EntityId,
        target: EntityId,
        damage: i32,
    },
    Deflected {
        projectile_id: u64,
        previous_owner: EntityId,
        by: EntityId,
    },
}

pub fn advance_projectiles(
    world: &mut World,
    physics: &mut dyn PhysicsWorld,
    tuning: &ProjectileTuning,
    now: u64,
) -> Vec<ProjectileOutcome> {
    let mut outcomes = Vec::new();
    let World {
        players,
        mobs,
        projectiles,
        ..
    } = world;

    for p in projectiles.values_mut() {
        let body_id = BodyId::Projectile(p.id);

        // Pull the integrated state back from physics.
        if let Some(body) = physics.get_body(body_id) {
            p.record_travel(body.position);
            p.set_velocity(body.velocity);
            if body.touching_boundary {
                p.mark_stuck(now);
            }
        }
        if p.is_stuck {
            continue;
        }
        if p.cap_speed() {
            physics.set_desired_velocity(body_id, p.velocity());
        }

        // Deflection is checked before hits so a parry wins over a same-tick hit.
        let previous_owner = p.owner_id;
        let deflector = players
            .values()
            .map(|pl| &pl.combatant)
            .chain(mobs.values().map(|m| &m.combatant))
            .find(|c| p.deflect(c, tuning.deflect_cone_deg, tuning.deflect_boost));
        if let Some(by) = deflector.map(|c| c.id) {
            physics.set_desired_velocity(body_id, p.velocity());
            debug!(
                projectile_id = p.id,
                %previous_owner,
                %by,
                "projectile deflected"
            );
            outcomes.push(ProjectileOutcome::Deflected {
                projectile_id: p.id,
                previous_owner,
                by,
            });
            continue;
        }

        // Naive O(P*E) overlap test; the first living opponent takes the hit.
        let target = players
            .values()
            .map(|pl| &pl.combatant)
            .chain(mobs.values().map(|m| &m.combatant))
            .find(|c| p.can_hit(c))
            .map(|c| c.id);
        if let Some(target) = target {
            p.register_hit();
            debug!(projectile_id = p.id, owner = %p.owner_id, %target, "projectile hit");
            outcomes.push(ProjectileOutcome::Hit {
                projectile_id: p.id,
                owner: p.owner_id,
                target,
                damage: p.damage,
            });
        }
    }
    outcomes
}

/// Removes projectiles that are out of range or have been stuck too long.
pub fn despawn_expired(world: &mut World, now: u64) -> Vec<Projectile> {
    let expired: Vec<u64> = world
        .projectiles
        .values()
        .filter(|p| p.should_despawn(now))
        .map(|p| p.id)
        .collect();
    expired
        .into_iter()
        .filter_map(|id| world.projectiles.remove(&id))
        .collect()
}
