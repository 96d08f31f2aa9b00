// Short delayed effects fired at the start of each tick.

use crate::domain::EntityId;
use crate::domain::world::World;
use std::collections::BTreeMap;

/// Window after an executed attack during which `is_attacking` stays set.
pub const ATTACK_ANIMATION_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEffect {
    ClearInvulnerability(EntityId),
    ResetAttackAnimation(EntityId),
}

/// Timers ordered by due time, then by scheduling order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    entries: BTreeMap<(u64, u64), TimerEffect>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: u64, effect: TimerEffect) {
        self.next_seq += 1;
        self.entries.insert((due, self.next_seq), effect);
    }

    pub fn pop_due(&mut self, now: u64) -> Vec<TimerEffect> {
        let later = self.entries.split_off(&(now.saturating_add(1), 0));
        let due = std::mem::replace(&mut self.entries, later);
        due.into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Applies one fired timer. Targets that are gone or dead are left alone.
pub fn apply_timer(world: &mut World, effect: TimerEffect) -> bool {
    match effect {
        TimerEffect::ClearInvulnerability(id) => match world.combatant_mut(id) {
            Some(c) if c.is_alive => {
                c.is_invulnerable = false;
                true
            }
            _ => false,
        },
        TimerEffect::ResetAttackAnimation(id) => {
            let (combatant, casting) = match id {
                EntityId::Player(raw) => match world.players.get_mut(&raw) {
                    Some(p) => (&mut p.combatant, p.attack.is_casting),
                    None => return false,
                },
                EntityId::Mob(raw) => match world.mobs.get_mut(&raw) {
                    Some(m) => (&mut m.combatant, m.attack.is_casting),
                    None => return false,
                },
            };
            if !combatant.is_alive || casting {
                return false;
            }
            combatant.is_attacking = false;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mob::Mob;
    use crate::domain::tuning::mob::default_archetypes;
    use glam::Vec2;

    #[test]
    fn when_timers_share_a_due_time_then_they_fire_in_schedule_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(500, TimerEffect::ResetAttackAnimation(EntityId::Mob(2)));
        timers.schedule(300, TimerEffect::ClearInvulnerability(EntityId::Mob(1)));
        timers.schedule(300, TimerEffect::ResetAttackAnimation(EntityId::Mob(1)));

        let due = timers.pop_due(300);

        assert_eq!(
            due,
            vec![
                TimerEffect::ClearInvulnerability(EntityId::Mob(1)),
                TimerEffect::ResetAttackAnimation(EntityId::Mob(1)),
            ]
        );
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn when_target_was_removed_then_timer_is_a_no_op() {
        let mut world = World::default();
        assert!(!apply_timer(
            &mut world,
            TimerEffect::ClearInvulnerability(EntityId::Player(9))
        ));
        assert!(!apply_timer(
            &mut world,
            TimerEffect::ResetAttackAnimation(EntityId::Mob(9))
        ));
    }

    #[test]
    fn when_mob_is_still_casting_then_attack_flag_survives_reset() {
        let mut world = World::default();
        let mut mob = Mob::new(1, &default_archetypes()[0], Vec2::ZERO, Vec::new(), 0);
        mob.combatant.is_attacking = true;
        mob.attack.is_casting = true;
        world.mobs.insert(1, mob);

        assert!(!apply_timer(
            &mut world,
            TimerEffect::ResetAttackAnimation(EntityId::Mob(1))
        ));
        assert!(world.mobs[&1].combatant.is_attacking);
    }
}
