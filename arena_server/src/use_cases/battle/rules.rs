// Pure combat resolution rules.

use crate::domain::attack::{AttackRejection, AttackState};
use crate::domain::combatant::Combatant;
use glam::Vec2;

/// Share of the base damage that mitigation can remove at most.
pub const MAX_MITIGATION: f64 = 0.8;

/// Whether `attacker` may hit `target` right now with a basic attack.
pub fn can_attack(
    attacker: &Combatant,
    target: &Combatant,
    now: u64,
) -> Result<(), AttackRejection> {
    if !target.is_alive {
        return Err(AttackRejection::TargetDead);
    }
    attacker.can_attack(now)?;
    let reach = attacker.attack_range + attacker.radius + target.radius;
    if attacker.distance_to(target.position()) > reach {
        return Err(AttackRejection::OutOfRange);
    }
    Ok(())
}

/// `max(1, floor(base - min(defense + armor, base * 0.8)))`.
pub fn calculate_damage(base: i32, defense: i32, armor: i32) -> i32 {
    let base = f64::from(base.max(0));
    let mitigation = f64::from(defense.saturating_add(armor).max(0)).min(base * MAX_MITIGATION);
    ((base - mitigation).floor() as i32).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageResult {
    /// Dead or inside an invulnerability window.
    Blocked,
    Applied { dealt: i32, killed: bool },
}

/// Applies already-mitigated damage. A nonzero hit opens the target's invulnerability window;
/// the caller is responsible for closing it.
pub fn apply_damage(target: &mut Combatant, amount: i32, now: u64) -> DamageResult {
    if !target.is_alive || target.is_invulnerable {
        return DamageResult::Blocked;
    }
    let amount = amount.max(0);
    let before = target.health;
    target.set_health(before - amount, now);
    let dealt = before - target.health;
    if dealt > 0 && target.is_alive && target.invulnerability_ms > 0 {
        target.is_invulnerable = true;
    }
    DamageResult::Applied {
        dealt,
        killed: !target.is_alive,
    }
}

/// Heals a living target up to its max health. Returns the amount actually restored.
pub fn heal(target: &mut Combatant, amount: i32, now: u64) -> Option<i32> {
    if !target.is_alive {
        return None;
    }
    let before = target.health;
    target.set_health(before.saturating_add(amount.max(0)), now);
    Some(target.health - before)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespawnRejection {
    CantRespawn,
}

/// Resets health, flags, statuses, attack state and velocity; optionally moves the entity.
pub fn respawn_entity(
    combatant: &mut Combatant,
    attack: &mut AttackState,
    position: Option<Vec2>,
    cant_respawn: bool,
) -> Result<(), RespawnRejection> {
    if cant_respawn {
        return Err(RespawnRejection::CantRespawn);
    }
    attack.interrupt();
    combatant.revive(position);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::combatant::test_support::combatant;
    use crate::domain::ids::EntityId;

    #[test]
    fn when_defense_and_armor_below_cap_then_they_are_subtracted() {
        assert_eq!(calculate_damage(10, 3, 2), 5);
    }

    #[test]
    fn when_defense_and_armor_are_extreme_then_mitigation_saturates_at_the_cap() {
        assert_eq!(calculate_damage(10, i32::MAX, i32::MAX), 2);
    }

    #[test]
    fn when_mitigation_exceeds_cap_then_eighty_percent_is_removed() {
        assert_eq!(calculate_damage(10, 50, 50), 2);
        assert_eq!(calculate_damage(3, 10, 0), 1);
    }

    #[test]
    fn when_base_damage_is_tiny_then_at_least_one_point_lands() {
        assert_eq!(calculate_damage(1, 5, 5), 1);
        assert_eq!(calculate_damage(0, 0, 0), 1);
    }

    #[test]
    fn when_damage_applied_then_target_becomes_briefly_invulnerable() {
        let mut target = combatant(EntityId::Mob(1), 0.0, 0.0);

        assert_eq!(
            apply_damage(&mut target, 30, 0),
            DamageResult::Applied {
                dealt: 30,
                killed: false
            }
        );
        assert!(target.is_invulnerable);
        assert_eq!(apply_damage(&mut target, 30, 10), DamageResult::Blocked);
        assert_eq!(target.health, 70);
    }

    #[test]
    fn when_health_reaches_zero_then_target_is_marked_dead_once() {
        let mut target = combatant(EntityId::Mob(1), 0.0, 0.0);

        let result = apply_damage(&mut target, 500, 42);

        assert_eq!(
            result,
            DamageResult::Applied {
                dealt: 100,
                killed: true
            }
        );
        assert_eq!(target.health, 0);
        assert_eq!(target.died_at, Some(42));
        assert!(!target.die(99));
        assert_eq!(target.died_at, Some(42));
    }

    #[test]
    fn when_damage_and_heal_alternate_then_health_stays_in_range() {
        let mut target = combatant(EntityId::Player(1), 0.0, 0.0);
        for step in 0..20u64 {
            target.is_invulnerable = false;
            apply_damage(&mut target, 13, step);
            heal(&mut target, 40, step);
            assert!((0..=target.max_health).contains(&target.health));
        }
        assert_eq!(target.health, target.max_health);
    }

    #[test]
    fn when_target_dead_then_heal_is_refused() {
        let mut target = combatant(EntityId::Player(1), 0.0, 0.0);
        target.die(0);
        assert_eq!(heal(&mut target, 10, 1), None);
        assert_eq!(target.health, 0);
    }

    #[test]
    fn when_target_out_of_reach_then_basic_attack_is_rejected() {
        let attacker = combatant(EntityId::Player(1), 0.0, 0.0);
        let near = combatant(EntityId::Mob(1), 11.0, 0.0);
        let far = combatant(EntityId::Mob(2), 13.0, 0.0);

        assert_eq!(can_attack(&attacker, &near, 0), Ok(()));
        assert_eq!(can_attack(&attacker, &far, 0), Err(AttackRejection::OutOfRange));
    }

    #[test]
    fn when_entity_cannot_respawn_then_respawn_is_rejected() {
        let mut c = combatant(EntityId::Mob(1), 0.0, 0.0);
        let mut attack = AttackState::default();
        c.die(0);

        assert_eq!(
            respawn_entity(&mut c, &mut attack, None, true),
            Err(RespawnRejection::CantRespawn)
        );
        assert!(!c.is_alive);

        assert_eq!(
            respawn_entity(&mut c, &mut attack, Some(Vec2::new(5.0, 6.0)), false),
            Ok(())
        );
        assert!(c.is_alive);
        assert_eq!(c.health, c.max_health);
        assert_eq!(c.position(), Vec2::new(5.0, 6.0));
    }
}
