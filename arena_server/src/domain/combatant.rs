// Shared combat state embedded by mobs and players.

use crate::domain::attack::AttackRejection;
use crate::domain::ids::EntityId;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Timed battle statuses; the map value on a combatant is the expiry time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEffect {
    /// Blocks attacks and interrupts any cast in progress.
    Stun,
    /// Halves movement speed.
    Slow,
}

/// Stat block used to build a combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatProfile {
    pub max_health: i32,
    #[serde(default)]
    pub defense: i32,
    #[serde(default)]
    pub armor: i32,
    pub attack_damage: i32,
    pub attack_range: f32,
    pub attack_delay_ms: u64,
    pub radius: f32,
    pub max_move_speed: f32,
    #[serde(default = "default_invulnerability_ms")]
    pub invulnerability_ms: u64,
}

fn default_invulnerability_ms() -> u64 {
    100
}

/// Read-only view of a potential target, captured when a decision or attack is made.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInfo {
    pub id: EntityId,
    pub position: Vec2,
    pub radius: f32,
    pub is_alive: bool,
}

#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    /// Facing in radians (0 = +X).
    pub heading: f32,

    pub health: i32,
    pub max_health: i32,
    pub defense: i32,
    pub armor: i32,

    pub attack_damage: i32,
    pub attack_range: f32,
    /// Current cooldown; combo steps may override it until the next attack.
    pub attack_delay_ms: u64,
    pub base_attack_delay_ms: u64,
    pub last_attack_at: Option<u64>,

    pub is_alive: bool,
    pub is_attacking: bool,
    pub is_invulnerable: bool,
    pub invulnerability_ms: u64,
    pub died_at: Option<u64>,

    pub statuses: BTreeMap<StatusEffect, u64>,
}

impl Combatant {
    pub fn new(id: EntityId, position: Vec2, profile: &CombatProfile) -> Self {
        let max_health = profile.max_health.max(1);
        Self {
            id,
            x: position.x,
            y: position.y,
            vx: 0.0,
            vy: 0.0,
            radius: profile.radius,
            heading: 0.0,
            health: max_health,
            max_health,
            defense: profile.defense,
            armor: profile.armor,
            attack_damage: profile.attack_damage,
            attack_range: profile.attack_range,
            attack_delay_ms: profile.attack_delay_ms,
            base_attack_delay_ms: profile.attack_delay_ms,
            last_attack_at: None,
            is_alive: true,
            is_attacking: false,
            is_invulnerable: false,
            invulnerability_ms: profile.invulnerability_ms,
            died_at: None,
            statuses: BTreeMap::new(),
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn set_position(&mut self, p: Vec2) {
        self.x = p.x;
        self.y = p.y;
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::new(self.vx, self.vy)
    }

    pub fn distance_to(&self, p: Vec2) -> f32 {
        self.position().distance(p)
    }

    pub fn target_info(&self) -> TargetInfo {
        TargetInfo {
            id: self.id,
            position: self.position(),
            radius: self.radius,
            is_alive: self.is_alive,
        }
    }

    /// Sets health within `[0, max_health]`; reaching zero kills the combatant.
    pub fn set_health(&mut self, value: i32, now: u64) {
        self.health = value.clamp(0, self.max_health);
        if self.health == 0 {
            self.die(now);
        }
    }

    /// Marks the combatant dead. Returns `true` only for the call that actually killed it;
    /// the first death time is never overwritten.
    pub fn die(&mut self, now: u64) -> bool {
        let was_alive = self.is_alive;
        self.is_alive = false;
        self.health = 0;
        self.is_attacking = false;
        self.vx = 0.0;
        self.vy = 0.0;
        if self.died_at.is_none() {
            self.died_at = Some(now);
        }
        was_alive
    }

    /// Brings the combatant back at full health with cleared combat flags.
    pub fn revive(&mut self, position: Option<Vec2>) {
        if let Some(p) = position {
            self.set_position(p);
        }
        self.health = self.max_health;
        self.is_alive = true;
        self.is_attacking = false;
        self.is_invulnerable = false;
        self.died_at = None;
        self.vx = 0.0;
        self.vy = 0.0;
        self.attack_delay_ms = self.base_attack_delay_ms;
        self.last_attack_at = None;
        self.statuses.clear();
    }

    pub fn apply_status(&mut self, status: StatusEffect, until: u64) {
        // Overlapping applications keep the later expiry.
        let expiry = self.statuses.entry(status).or_insert(until);
        *expiry = (*expiry).max(until);
    }

    pub fn has_status(&self, status: StatusEffect, now: u64) -> bool {
        self.statuses.get(&status).is_some_and(|until| *until > now)
    }

    pub fn is_stunned(&self, now: u64) -> bool {
        self.has_status(StatusEffect::Stun, now)
    }

    /// Drops statuses whose expiry has passed.
    pub fn expire_statuses(&mut self, now: u64) {
        self.statuses.retain(|_, until| *until > now);
    }

    pub fn cooldown_elapsed(&self, now: u64) -> bool {
        match self.last_attack_at {
            Some(at) => now.saturating_sub(at) >= self.attack_delay_ms,
            None => true,
        }
    }

    /// Gate shared by every strategy: alive, not stunned, cooldown elapsed.
    pub fn can_attack(&self, now: u64) -> Result<(), AttackRejection> {
        if !self.is_alive {
            return Err(AttackRejection::AttackerDead);
        }
        if self.is_stunned(now) {
            return Err(AttackRejection::Stunned);
        }
        if !self.cooldown_elapsed(now) {
            return Err(AttackRejection::OnCooldown);
        }
        Ok(())
    }

    /// Records an executed attack; `cooldown_ms` overrides the base delay until the next one.
    pub fn mark_attack(&mut self, now: u64, cooldown_ms: Option<u64>) {
        self.last_attack_at = Some(now);
        self.attack_delay_ms = cooldown_ms.unwrap_or(self.base_attack_delay_ms);
        self.is_attacking = true;
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::combatant;
    use super::*;

    #[test]
    fn when_die_called_twice_then_first_death_time_is_kept() {
        let mut c = combatant(EntityId::Mob(1), 0.0, 0.0);

        assert!(c.die(500));
        assert!(!c.die(900));

        assert!(!c.is_alive);
        assert_eq!(c.died_at, Some(500));
        assert_eq!(c.health, 0);
    }

    #[test]
    fn when_health_set_out_of_range_then_it_is_clamped() {
        let mut c = combatant(EntityId::Mob(1), 0.0, 0.0);

        c.set_health(250, 0);
        assert_eq!(c.health, 100);

        c.set_health(-5, 10);
        assert_eq!(c.health, 0);
        assert!(!c.is_alive);
        assert_eq!(c.died_at, Some(10));
    }

    #[test]
    fn when_cooldown_not_elapsed_then_can_attack_rejects() {
        let mut c = combatant(EntityId::Player(1), 0.0, 0.0);
        c.mark_attack(1_000, None);

        assert!(matches!(
            c.can_attack(1_500),
            Err(AttackRejection::OnCooldown)
        ));
        assert!(c.can_attack(2_000).is_ok());
    }

    #[test]
    fn when_step_cooldown_given_then_it_overrides_base_delay_once() {
        let mut c = combatant(EntityId::Player(1), 0.0, 0.0);
        c.mark_attack(0, Some(3_000));
        assert!(c.can_attack(2_000).is_err());

        c.mark_attack(3_000, None);
        assert_eq!(c.attack_delay_ms, 1_000);
    }

    #[test]
    fn when_stunned_then_can_attack_rejects_until_expiry() {
        let mut c = combatant(EntityId::Mob(1), 0.0, 0.0);
        c.apply_status(StatusEffect::Stun, 400);

        assert!(matches!(c.can_attack(100), Err(AttackRejection::Stunned)));
        assert!(c.can_attack(400).is_ok());
    }

    #[test]
    fn when_revived_then_flags_and_health_reset() {
        let mut c = combatant(EntityId::Mob(1), 0.0, 0.0);
        c.apply_status(StatusEffect::Slow, 1_000);
        c.die(10);

        c.revive(Some(Vec2::new(3.0, 4.0)));

        assert!(c.is_alive);
        assert_eq!(c.health, c.max_health);
        assert_eq!(c.died_at, None);
        assert!(c.statuses.is_empty());
        assert_eq!(c.position(), Vec2::new(3.0, 4.0));
    }
}
