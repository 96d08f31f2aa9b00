// Player-controlled combatants; bot mode hands control to the AI module.

use crate::domain::agent::{Agent, AgentState};
use crate::domain::attack::{AttackState, AttackTick, SharedStrategy, update_attacker};
use crate::domain::combatant::{Combatant, TargetInfo};
use crate::domain::geometry::heading_to;
use crate::domain::ids::EntityId;
use crate::domain::state::PlayerInput;
use crate::domain::tuning::player::PlayerTuning;
use glam::Vec2;

#[derive(Debug, Clone)]
pub struct Player {
    pub combatant: Combatant,
    pub agent: AgentState,
    pub attack: AttackState,
    pub strategies: Vec<SharedStrategy>,
    pub display_name: String,
    pub input: PlayerInput,
    pub is_bot: bool,
    pub turn_rate: f32,
    /// Set once a respawn action has been queued for the current death.
    pub respawn_requested: bool,
}

impl Player {
    pub fn new(
        id: u64,
        display_name: String,
        position: Vec2,
        tuning: &PlayerTuning,
        strategies: Vec<SharedStrategy>,
    ) -> Self {
        Self {
            combatant: Combatant::new(EntityId::Player(id), position, &tuning.profile),
            agent: AgentState::new(tuning.profile.max_move_speed),
            attack: AttackState::default(),
            strategies,
            display_name,
            input: PlayerInput::default(),
            is_bot: false,
            turn_rate: tuning.turn_rate,
            respawn_requested: false,
        }
    }

    /// Velocity requested by manual input, capped at the player's speed.
    pub fn input_velocity(&self, now: u64) -> Vec2 {
        let dir = Vec2::new(self.input.move_x, self.input.move_y).clamp_length_max(1.0);
        dir * self.effective_max_speed(now)
    }

    pub fn aim_point(&self) -> Option<Vec2> {
        match (self.input.aim_x, self.input.aim_y) {
            (Some(x), Some(y)) => Some(Vec2::new(x, y)),
            _ => None,
        }
    }

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

    /// Attack with nothing in reach: commits the cooldown and opens a deflection window.
    pub fn swing(&mut self, now: u64) -> bool {
        if !self.attack.is_idle() || self.combatant.can_attack(now).is_err() {
            return false;
        }
        if let Some(aim) = self.aim_point() {
            self.combatant.heading = heading_to(self.combatant.position(), aim);
        }
        self.combatant.mark_attack(now, None);
        true
    }

    pub fn set_bot_mode(&mut self, enabled: bool) {
        self.is_bot = enabled;
        self.agent.reset();
        self.input = PlayerInput::default();
    }
}

impl Agent for Player {
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
