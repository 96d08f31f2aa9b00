// Non-player combatants managed by the lifecycle manager.

use crate::domain::agent::{Agent, AgentState};
use crate::domain::attack::{AttackState, AttackTick, SharedStrategy, update_attacker};
use crate::domain::combatant::{Combatant, TargetInfo};
use crate::domain::ids::EntityId;
use crate::domain::tuning::mob::MobArchetype;
use glam::Vec2;

#[derive(Debug, Clone)]
pub struct Mob {
    pub combatant: Combatant,
    pub agent: AgentState,
    pub attack: AttackState,
    pub strategies: Vec<SharedStrategy>,
    pub archetype: String,
    pub turn_rate: f32,
    pub spawned_at: u64,
    /// Explicit removal request; skips the respawn delay once the mob is dead.
    pub ready_to_remove: bool,
    pub cant_respawn: bool,
}

impl Mob {
    pub fn new(
        id: u64,
        archetype: &MobArchetype,
        position: Vec2,
        strategies: Vec<SharedStrategy>,
        now: u64,
    ) -> Self {
        Self {
            combatant: Combatant::new(EntityId::Mob(id), position, &archetype.profile),
            agent: AgentState::new(archetype.profile.max_move_speed),
            attack: AttackState::default(),
            strategies,
            archetype: archetype.name.clone(),
            turn_rate: archetype.turn_rate,
            spawned_at: now,
            ready_to_remove: false,
            cant_respawn: archetype.cant_respawn,
        }
    }

    /// Dead and either flagged for removal or dead for at least `respawn_delay_ms`.
    pub fn ready_to_be_removed(&self, now: u64, respawn_delay_ms: u64) -> bool {
        if self.combatant.is_alive {
            return false;
        }
        if self.ready_to_remove {
            return true;
        }
        self.combatant
            .died_at
            .is_some_and(|died_at| now.saturating_sub(died_at) >= respawn_delay_ms)
    }

    /// Per-tick update: statuses, cooldowns, heading and attack-queue execution.
    pub fn update(&mut self, now: u64, dt: f32, target: Option<&TargetInfo>) -> AttackTick {
        update_attacker(
            &mut self.combatant,
            &mut self.attack,
            &self.strategies,
            self.turn_rate,
            now,
            dt,
            target,
        )
    }
}

impl Agent for Mob {
    fn combatant(&self) -> &Combatant {
        &self.combatant
    }

    fn agent_state(&self) -> &AgentState {
        &self.agent
    }

    fn agent_state_mut(&mut self) -> &mut AgentState {
        &mut self.agent
    }

    fn strategies(&self) -> &[SharedStrategy] {
        &self.strategies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::attack::MeleeStrategy;
    use crate::domain::tuning::mob::default_archetypes;
    use std::sync::Arc;

    fn grunt(id: u64) -> Mob {
        let archetype = &default_archetypes()[0];
        Mob::new(
            id,
            archetype,
            Vec2::new(10.0, 10.0),
            vec![Arc::new(MeleeStrategy::default())],
            0,
        )
    }

    #[test]
    fn when_alive_then_never_ready_to_be_removed() {
        let mut mob = grunt(1);
        mob.ready_to_remove = true;
        assert!(!mob.ready_to_be_removed(1_000_000, 0));
    }

    #[test]
    fn when_dead_then_removal_waits_for_respawn_delay() {
        let mut mob = grunt(1);
        mob.combatant.die(1_000);

        assert!(!mob.ready_to_be_removed(5_999, 5_000));
        assert!(mob.ready_to_be_removed(6_000, 5_000));
    }

    #[test]
    fn when_dead_and_flagged_then_removal_is_immediate() {
        let mut mob = grunt(1);
        mob.combatant.die(1_000);
        mob.ready_to_remove = true;

        assert!(mob.ready_to_be_removed(1_000, 5_000));
    }
}
