// Projectile ballistics: launch, travel bookkeeping, hits and deflection.

use crate::domain::attack::ProjectileLaunch;
use crate::domain::combatant::Combatant;
use crate::domain::geometry::{angle_between, heading_to, steer_towards};
use crate::domain::ids::EntityId;
use crate::domain::tuning::projectile::ProjectileTuning;
use glam::Vec2;

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u64,
    pub owner_id: EntityId,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub damage: i32,
    pub radius: f32,
    pub max_range: f32,
    pub distance_traveled: f32,
    /// Set by the first hit; cleared only by a deflection.
    pub has_hit: bool,
    pub is_stuck: bool,
    pub stuck_at: Option<u64>,
    /// Time a stuck projectile stays in the world.
    pub lifetime_ms: u64,
    pub deflected_by: Option<EntityId>,
    /// Per-projectile speed cap; raised when deflected.
    pub speed_cap: f32,
    pub spawned_at: u64,
}

impl Projectile {
    /// Launches toward the captured aim point at the strategy's speed, capped at the global max.
    pub fn launch(id: u64, params: &ProjectileLaunch, tuning: &ProjectileTuning, now: u64) -> Self {
        let speed = params.speed.min(tuning.max_speed);
        let mut velocity = steer_towards(params.origin, params.aim_point, speed);
        if velocity == Vec2::ZERO {
            // Aim point on top of the origin: fall back to +X.
            velocity = Vec2::new(speed, 0.0);
        }
        Self {
            id,
            owner_id: params.owner,
            x: params.origin.x,
            y: params.origin.y,
            vx: velocity.x,
            vy: velocity.y,
            damage: params.damage,
            radius: params.radius,
            max_range: params.max_range,
            distance_traveled: 0.0,
            has_hit: false,
            is_stuck: false,
            stuck_at: None,
            lifetime_ms: tuning.stuck_lifetime_ms,
            deflected_by: None,
            speed_cap: tuning.max_speed,
            spawned_at: now,
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::new(self.vx, self.vy)
    }

    pub fn heading(&self) -> f32 {
        self.vy.atan2(self.vx)
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.vx = velocity.x;
        self.vy = velocity.y;
    }

    /// Re-applies the speed cap after external velocity changes. Returns `true` when the
    /// velocity had to be reduced.
    pub fn cap_speed(&mut self) -> bool {
        let v = self.velocity();
        let capped = v.clamp_length_max(self.speed_cap);
        if capped == v {
            return false;
        }
        self.set_velocity(capped);
        true
    }

    /// Moves to `position` and accumulates the distance covered.
    pub fn record_travel(&mut self, position: Vec2) {
        self.distance_traveled += self.position().distance(position);
        self.x = position.x;
        self.y = position.y;
    }

    pub fn mark_stuck(&mut self, now: u64) {
        if !self.is_stuck {
            self.is_stuck = true;
            self.stuck_at = Some(now);
        }
        self.vx = 0.0;
        self.vy = 0.0;
    }

    pub fn should_despawn(&self, now: u64) -> bool {
        if self.distance_traveled >= self.max_range {
            return true;
        }
        match (self.is_stuck, self.stuck_at) {
            (true, Some(at)) => now.saturating_sub(at) >= self.lifetime_ms,
            _ => false,
        }
    }

    /// Whether `target` overlaps the projectile and may take damage from it.
    pub fn can_hit(&self, target: &Combatant) -> bool {
        if self.has_hit || !target.is_alive || target.is_invulnerable {
            return false;
        }
        if !self.owner_id.opposes(target.id) {
            return false;
        }
        let reach = self.radius + target.radius;
        self.position().distance_squared(target.position()) <= reach * reach
    }

    pub fn register_hit(&mut self) {
        self.has_hit = true;
    }

    /// Turns the projectile back on its shooter's side.
    ///
    /// Requires the deflector to be alive and mid-attack, opposed to the current owner,
    /// within melee reach and facing the projectile within `cone_deg`. Allowed once.
    pub fn deflect(&mut self, deflector: &Combatant, cone_deg: f32, boost: f32) -> bool {
        if self.deflected_by.is_some() || !deflector.is_alive || !deflector.is_attacking {
            return false;
        }
        if !deflector.id.opposes(self.owner_id) {
            return false;
        }
        let reach = deflector.attack_range + deflector.radius + self.radius;
        let offset = self.position() - deflector.position();
        if offset.length_squared() > reach * reach {
            return false;
        }
        let bearing = heading_to(deflector.position(), self.position());
        if offset.length_squared() > f32::EPSILON
            && angle_between(deflector.heading, bearing) > cone_deg.to_radians()
        {
            return false;
        }

        let velocity = -self.velocity() * boost;
        self.vx = velocity.x;
        self.vy = velocity.y;
        self.speed_cap *= boost;
        self.owner_id = deflector.id;
        self.has_hit = false;
        self.distance_traveled = 0.0;
        self.is_stuck = false;
        self.stuck_at = None;
        self.deflected_by = Some(deflector.id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::combatant::test_support::combatant;

    fn params(owner: EntityId, origin: Vec2, aim_point: Vec2, speed: f32) -> ProjectileLaunch {
        ProjectileLaunch {
            owner,
            origin,
            aim_point,
            speed,
            damage: 8,
            radius: 0.5,
            max_range: 50.0,
        }
    }

    fn arrow_from_mob() -> Projectile {
        let params = params(EntityId::Mob(9), Vec2::new(10.0, 0.0), Vec2::ZERO, 20.0);
        Projectile::launch(1, &params, &ProjectileTuning::default(), 0)
    }

    #[test]
    fn when_launch_speed_exceeds_global_cap_then_it_is_clamped() {
        let tuning = ProjectileTuning::default();
        let params = params(EntityId::Mob(1), Vec2::ZERO, Vec2::new(0.0, 10.0), 1_000.0);
        let p = Projectile::launch(1, &params, &tuning, 0);
        assert!((p.velocity().length() - tuning.max_speed).abs() < 1e-3);
        assert!(p.vx.abs() < 1e-4);
    }

    #[test]
    fn when_hit_registered_then_no_target_can_be_hit_again() {
        let mut p = arrow_from_mob();
        let target = combatant(EntityId::Player(1), 10.0, 0.0);
        assert!(p.can_hit(&target));

        p.register_hit();

        let other = combatant(EntityId::Player(2), 10.0, 0.0);
        assert!(!p.can_hit(&target));
        assert!(!p.can_hit(&other));
    }

    #[test]
    fn when_target_is_invulnerable_then_the_hit_is_kept_for_later() {
        let p = arrow_from_mob();
        let mut target = combatant(EntityId::Player(1), 10.0, 0.0);
        target.is_invulnerable = true;

        assert!(!p.can_hit(&target));
        assert!(!p.has_hit);

        target.is_invulnerable = false;
        assert!(p.can_hit(&target));
    }

    #[test]
    fn when_owner_side_overlaps_then_it_is_not_a_valid_target() {
        let p = arrow_from_mob();
        let ally = combatant(EntityId::Mob(2), 10.0, 0.0);
        assert!(!p.can_hit(&ally));
    }

    #[test]
    fn when_traveled_past_max_range_then_it_despawns() {
        let mut p = arrow_from_mob();
        p.record_travel(Vec2::new(-40.0, 0.0));
        assert!(p.should_despawn(0));
    }

    #[test]
    fn when_stuck_longer_than_lifetime_then_it_despawns() {
        let mut p = arrow_from_mob();
        p.mark_stuck(1_000);
        assert!(!p.should_despawn(2_999));
        assert!(p.should_despawn(3_000));
    }

    #[test]
    fn when_attacking_player_faces_projectile_then_it_is_deflected_once() {
        let mut p = arrow_from_mob();
        let mut player = combatant(EntityId::Player(1), 8.0, 0.0);
        player.heading = 0.0;
        player.is_attacking = true;
        p.register_hit();

        assert!(p.deflect(&player, 60.0, 1.5));
        assert_eq!(p.owner_id, EntityId::Player(1));
        assert_eq!(p.deflected_by, Some(EntityId::Player(1)));
        assert!(!p.has_hit);
        assert!(p.vx > 0.0);
        assert!((p.velocity().length() - 30.0).abs() < 1e-3);
        assert!((p.speed_cap - 60.0).abs() < 1e-3);

        let mut mob = combatant(EntityId::Mob(3), 12.0, 0.0);
        mob.heading = std::f32::consts::PI;
        mob.is_attacking = true;
        assert!(!p.deflect(&mob, 60.0, 1.5));
    }

    #[test]
    fn when_projectile_is_behind_deflector_then_deflection_fails() {
        let mut p = arrow_from_mob();
        let mut player = combatant(EntityId::Player(1), 8.0, 0.0);
        player.heading = std::f32::consts::PI;
        player.is_attacking = true;

        assert!(!p.deflect(&player, 60.0, 1.5));
        assert_eq!(p.deflected_by, None);
    }

    #[test]
    fn when_deflector_is_not_attacking_then_deflection_fails() {
        let mut p = arrow_from_mob();
        let player = combatant(EntityId::Player(1), 8.0, 0.0);
        assert!(!p.deflect(&player, 60.0, 1.5));
    }
}
