use super::definition::{AttackDefinition, AttackEffect, AttackRejection, AttemptOutcome};
use super::strategy::SharedStrategy;
use crate::domain::combatant::{Combatant, TargetInfo};
use crate::domain::geometry::rotate_towards;
use crate::domain::ids::EntityId;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A committed attack step waiting for its execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAttack {
    pub definition: AttackDefinition,
    /// Absolute room time at which the step fires.
    pub execution_time: u64,
    pub target: Option<EntityId>,
    /// Target position captured at cast start; projectiles fly here, not at the live target.
    pub aim_point: Vec2,
}

/// Casting state owned by the attacking entity.
///
/// Idle when not casting and the queue is empty. Accepting a windup attack enters casting;
/// steps execute as their time comes; the last step returns the state to idle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttackState {
    pub queue: VecDeque<QueuedAttack>,
    pub is_casting: bool,
    pub cast_start: Option<u64>,
    pub current_strategy: Option<String>,
    pub locked_heading: Option<f32>,
}

impl AttackState {
    pub fn is_idle(&self) -> bool {
        !self.is_casting && self.queue.is_empty()
    }

    /// Commits `steps` with execution times at `now` plus the cumulative windup.
    pub fn begin_cast(
        &mut self,
        strategy: &str,
        steps: Vec<AttackDefinition>,
        now: u64,
        target: Option<EntityId>,
        aim_point: Vec2,
        heading: f32,
    ) {
        self.queue.clear();
        let mut at = now;
        for definition in steps {
            at += definition.windup_ms;
            self.queue.push_back(QueuedAttack {
                definition,
                execution_time: at,
                target,
                aim_point,
            });
        }
        self.is_casting = true;
        self.cast_start = Some(now);
        self.current_strategy = Some(strategy.to_string());
        self.locked_heading = Some(heading);
    }

    /// Drops the cast and every pending step. Returns how many steps were lost.
    pub fn interrupt(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        self.finish();
        dropped
    }

    fn finish(&mut self) {
        self.is_casting = false;
        self.cast_start = None;
        self.current_strategy = None;
        self.locked_heading = None;
    }

    fn pop_due(&mut self, now: u64) -> Vec<QueuedAttack> {
        let mut due = Vec::new();
        while self
            .queue
            .front()
            .is_some_and(|step| step.execution_time <= now)
        {
            if let Some(step) = self.queue.pop_front() {
                due.push(step);
            }
        }
        due
    }
}

/// What happened to one combatant's attack state during an update.
#[derive(Debug, Default)]
pub struct AttackTick {
    pub effects: Vec<AttackEffect>,
    /// Steps that fired this update.
    pub executed: usize,
    /// Steps dropped by an interruption.
    pub interrupted: usize,
    /// A new attack was accepted (immediate or casting).
    pub started: bool,
    pub rejection: Option<AttackRejection>,
}

impl AttackTick {
    /// True when the entity swung or began a cast this update.
    pub fn attacked(&self) -> bool {
        self.started || self.executed > 0
    }
}

/// Advances statuses, heading and the attack queue of one combatant.
///
/// A stun (or death) interrupts unconditionally, before any due step is looked at.
pub fn tick_attack_state(
    combatant: &mut Combatant,
    state: &mut AttackState,
    now: u64,
    dt: f32,
    turn_rate: f32,
) -> AttackTick {
    let mut tick = AttackTick::default();
    combatant.expire_statuses(now);

    if !combatant.is_alive || combatant.is_stunned(now) {
        if !state.is_idle() {
            tick.interrupted = state.interrupt();
        }
        return tick;
    }

    if let Some(locked) = state.locked_heading {
        combatant.heading = rotate_towards(combatant.heading, locked, turn_rate * dt);
    }

    for step in state.pop_due(now) {
        if let Some(effect) = step
            .definition
            .resolve(combatant, step.target, step.aim_point)
        {
            tick.effects.push(effect);
        }
        combatant.mark_attack(now, step.definition.cooldown_ms);
        tick.executed += 1;
    }

    if state.is_casting && state.queue.is_empty() {
        state.finish();
    }
    tick
}

/// Full per-tick attack update: advance the queue, then try to engage `target` when idle.
pub fn update_attacker(
    combatant: &mut Combatant,
    state: &mut AttackState,
    strategies: &[SharedStrategy],
    turn_rate: f32,
    now: u64,
    dt: f32,
    target: Option<&TargetInfo>,
) -> AttackTick {
    let mut tick = tick_attack_state(combatant, state, now, dt, turn_rate);
    if !combatant.is_alive || !state.is_idle() {
        return tick;
    }

    // Face the direction of travel while not committed to a cast.
    let velocity = combatant.velocity();
    if velocity.length_squared() > f32::EPSILON {
        let travel = velocity.y.atan2(velocity.x);
        combatant.heading = rotate_towards(combatant.heading, travel, turn_rate * dt);
    }

    if let Some(target) = target {
        let outcome = try_attack(combatant, state, strategies, target, now);
        if outcome.can_execute {
            tick.started = true;
            tick.effects.extend(outcome.effects);
        } else {
            tick.rejection = outcome.rejection;
        }
    }
    tick
}

/// Tries each strategy in preference order and commits the first one that accepts.
pub fn try_attack(
    combatant: &mut Combatant,
    state: &mut AttackState,
    strategies: &[SharedStrategy],
    target: &TargetInfo,
    now: u64,
) -> AttemptOutcome {
    if !state.is_idle() {
        return AttemptOutcome::rejected(AttackRejection::Busy);
    }

    let mut last_rejection = AttackRejection::NoStrategy;
    for strategy in strategies {
        let outcome = strategy.attempt_execute(combatant, state, target, now);
        if outcome.can_execute {
            return outcome;
        }
        if let Some(reason) = outcome.rejection {
            last_rejection = reason;
        }
    }
    AttemptOutcome::rejected(last_rejection)
}
