// Capability shared by everything the AI module can drive.

use crate::domain::attack::SharedStrategy;
use crate::domain::combatant::{Combatant, StatusEffect};
use crate::domain::ids::EntityId;
use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    #[default]
    Idle,
    AvoidBoundary,
    Attack,
    Chase,
    Wander,
}

impl Behavior {
    pub fn as_str(self) -> &'static str {
        match self {
            Behavior::Idle => "idle",
            Behavior::AvoidBoundary => "avoid_boundary",
            Behavior::Attack => "attack",
            Behavior::Chase => "chase",
            Behavior::Wander => "wander",
        }
    }
}

/// Output of a behavior policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub behavior: Behavior,
    /// Re-evaluation is skipped until this time.
    pub lock_until: Option<u64>,
    pub attack_target: Option<EntityId>,
    pub chase_target: Option<EntityId>,
    pub desired_velocity: Vec2,
    /// New wander point, when the policy re-rolled one.
    pub wander_target: Option<Vec2>,
}

impl Decision {
    pub fn new(behavior: Behavior, desired_velocity: Vec2) -> Self {
        Self {
            behavior,
            lock_until: None,
            attack_target: None,
            chase_target: None,
            desired_velocity,
            wander_target: None,
        }
    }
}

/// Behavior fields carried by mobs and players alike.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState {
    pub current_behavior: Behavior,
    pub behavior_locked_until: u64,
    pub attack_target: Option<EntityId>,
    pub chase_target: Option<EntityId>,
    pub wander_target: Option<Vec2>,
    pub wander_set_at: u64,
    pub max_move_speed: f32,
    pub desired_velocity: Vec2,
}

impl AgentState {
    pub fn new(max_move_speed: f32) -> Self {
        Self {
            current_behavior: Behavior::Idle,
            behavior_locked_until: 0,
            attack_target: None,
            chase_target: None,
            wander_target: None,
            wander_set_at: 0,
            max_move_speed,
            desired_velocity: Vec2::ZERO,
        }
    }

    /// Forgets the current decision, e.g. after death or when a bot is switched off.
    pub fn reset(&mut self) {
        *self = Self::new(self.max_move_speed);
    }
}

/// Anything exposing these accessors can be driven by the AI module; mobs and bot-controlled
/// players share the same policies through it.
pub trait Agent {
    fn combatant(&self) -> &Combatant;
    fn agent_state(&self) -> &AgentState;
    fn agent_state_mut(&mut self) -> &mut AgentState;
    fn strategies(&self) -> &[SharedStrategy];

    fn id(&self) -> EntityId {
        self.combatant().id
    }

    fn is_locked(&self, now: u64) -> bool {
        now < self.agent_state().behavior_locked_until
    }

    /// Max speed after statuses are taken into account.
    fn effective_max_speed(&self, now: u64) -> f32 {
        let base = self.agent_state().max_move_speed;
        if self.combatant().has_status(StatusEffect::Slow, now) {
            base * 0.5
        } else {
            base
        }
    }

    /// Longest range at which any of the agent's strategies can engage this target.
    fn best_attack_range(&self, target_radius: f32) -> f32 {
        self.strategies()
            .iter()
            .map(|s| s.max_range(self.combatant(), target_radius))
            .fold(0.0, f32::max)
    }

    fn apply_decision(&mut self, decision: &Decision, now: u64) {
        let state = self.agent_state_mut();
        state.current_behavior = decision.behavior;
        state.behavior_locked_until = decision.lock_until.unwrap_or(0);
        state.attack_target = decision.attack_target;
        state.chase_target = decision.chase_target;
        if let Some(target) = decision.wander_target {
            state.wander_target = Some(target);
            state.wander_set_at = now;
        }
        state.desired_velocity = decision.desired_velocity;
    }

    fn set_desired_velocity(&mut self, velocity: Vec2) {
        self.agent_state_mut().desired_velocity = velocity;
    }
}
