// Default behavior policies, evaluated highest priority first.

use crate::domain::agent::{Agent, Behavior, Decision};
use crate::domain::geometry::steer_towards;
use crate::domain::ports::PerceptionSnapshot;
use crate::domain::tuning::ai::AiTuning;
use glam::Vec2;
use rand::Rng;
use rand::rngs::StdRng;
use std::f32::consts::TAU;

/// Inputs a policy sees for one agent during one decision pass.
pub struct PolicyContext<'a> {
    pub snapshot: PerceptionSnapshot,
    pub tuning: &'a AiTuning,
    pub rng: &'a mut StdRng,
    pub now: u64,
}

pub trait BehaviorPolicy: Send + Sync {
    fn name(&self) -> &'static str;
    fn priority(&self) -> u8;
    fn can_apply(&self, agent: &dyn Agent, ctx: &PolicyContext<'_>) -> bool;
    fn decide(&self, agent: &dyn Agent, ctx: &mut PolicyContext<'_>) -> Decision;
}

/// The built-in rule set, sorted by descending priority.
pub fn default_policies() -> Vec<Box<dyn BehaviorPolicy>> {
    let mut policies: Vec<Box<dyn BehaviorPolicy>> = vec![
        Box::new(AvoidBoundary),
        Box::new(AttackPolicy),
        Box::new(ChasePolicy),
        Box::new(WanderPolicy),
    ];
    policies.sort_by(|a, b| b.priority().cmp(&a.priority()));
    policies
}

pub struct AvoidBoundary;

impl BehaviorPolicy for AvoidBoundary {
    fn name(&self) -> &'static str {
        "avoid_boundary"
    }

    fn priority(&self) -> u8 {
        10
    }

    fn can_apply(&self, _agent: &dyn Agent, ctx: &PolicyContext<'_>) -> bool {
        ctx.snapshot.near_boundary
    }

    fn decide(&self, agent: &dyn Agent, ctx: &mut PolicyContext<'_>) -> Decision {
        let c = agent.combatant();
        let bounds = ctx.snapshot.bounds;
        let edge = ctx.tuning.boundary_buffer + c.radius;
        let speed = agent.effective_max_speed(ctx.now);

        // Push away from each violated edge, proportional to how deep the violation is.
        let mut escape = Vec2::ZERO;
        escape.x += (edge - (c.x - bounds.min_x)).max(0.0);
        escape.x -= (edge - (bounds.max_x - c.x)).max(0.0);
        escape.y += (edge - (c.y - bounds.min_y)).max(0.0);
        escape.y -= (edge - (bounds.max_y - c.y)).max(0.0);

        let velocity = if escape.length_squared() > f32::EPSILON {
            escape.normalize() * speed
        } else {
            steer_towards(c.position(), bounds.center(), speed)
        };
        let mut decision = Decision::new(Behavior::AvoidBoundary, velocity);
        decision.lock_until = Some(ctx.now + ctx.tuning.boundary_lock_ms);
        decision
    }
}

pub struct AttackPolicy;

impl BehaviorPolicy for AttackPolicy {
    fn name(&self) -> &'static str {
        "attack"
    }

    fn priority(&self) -> u8 {
        8
    }

    fn can_apply(&self, agent: &dyn Agent, ctx: &PolicyContext<'_>) -> bool {
        match (ctx.snapshot.nearest_opposing, ctx.snapshot.distance) {
            (Some(target), Some(distance)) => {
                target.is_alive && distance <= agent.best_attack_range(target.radius)
            }
            _ => false,
        }
    }

    fn decide(&self, agent: &dyn Agent, ctx: &mut PolicyContext<'_>) -> Decision {
        let (Some(target), Some(distance)) = (ctx.snapshot.nearest_opposing, ctx.snapshot.distance)
        else {
            return Decision::new(Behavior::Idle, Vec2::ZERO);
        };
        let best = agent.best_attack_range(target.radius);
        let velocity = if distance <= best * ctx.tuning.attack_hold_fraction {
            Vec2::ZERO
        } else {
            steer_towards(
                agent.combatant().position(),
                target.position,
                agent.effective_max_speed(ctx.now),
            )
        };
        let mut decision = Decision::new(Behavior::Attack, velocity);
        decision.lock_until = Some(ctx.now + ctx.tuning.attack_lock_ms);
        decision.attack_target = Some(target.id);
        decision
    }
}

pub struct ChasePolicy;

impl BehaviorPolicy for ChasePolicy {
    fn name(&self) -> &'static str {
        "chase"
    }

    fn priority(&self) -> u8 {
        5
    }

    fn can_apply(&self, _agent: &dyn Agent, ctx: &PolicyContext<'_>) -> bool {
        match (ctx.snapshot.nearest_opposing, ctx.snapshot.distance) {
            (Some(target), Some(distance)) => {
                target.is_alive && distance <= ctx.tuning.chase_radius
            }
            _ => false,
        }
    }

    fn decide(&self, agent: &dyn Agent, ctx: &mut PolicyContext<'_>) -> Decision {
        let (Some(target), Some(distance)) = (ctx.snapshot.nearest_opposing, ctx.snapshot.distance)
        else {
            return Decision::new(Behavior::Idle, Vec2::ZERO);
        };
        let max = agent.effective_max_speed(ctx.now);
        // Slow down on approach so the agent does not overshoot.
        let speed = if distance <= ctx.tuning.chase_stopping_distance {
            max * ctx.tuning.stopping_speed_fraction
        } else {
            max
        };
        let velocity = steer_towards(agent.combatant().position(), target.position, speed);
        let mut decision = Decision::new(Behavior::Chase, velocity);
        decision.chase_target = Some(target.id);
        decision
    }
}

pub struct WanderPolicy;

impl WanderPolicy {
    fn needs_new_target(agent: &dyn Agent, ctx: &PolicyContext<'_>) -> bool {
        let state = agent.agent_state();
        match state.wander_target {
            None => true,
            Some(target) => {
                ctx.now.saturating_sub(state.wander_set_at) >= ctx.tuning.wander_refresh_ms
                    || agent.combatant().distance_to(target) <= ctx.tuning.wander_arrival_distance
            }
        }
    }
}

impl BehaviorPolicy for WanderPolicy {
    fn name(&self) -> &'static str {
        "wander"
    }

    fn priority(&self) -> u8 {
        1
    }

    fn can_apply(&self, _agent: &dyn Agent, _ctx: &PolicyContext<'_>) -> bool {
        true
    }

    fn decide(&self, agent: &dyn Agent, ctx: &mut PolicyContext<'_>) -> Decision {
        let c = agent.combatant();
        let mut rerolled = None;
        let target = match agent.agent_state().wander_target {
            Some(target) if !Self::needs_new_target(agent, ctx) => target,
            _ => {
                let angle = ctx.rng.random_range(0.0..TAU);
                let min = ctx.tuning.wander_min_distance;
                let max = ctx.tuning.wander_max_distance.max(min);
                let distance = if max > min {
                    ctx.rng.random_range(min..max)
                } else {
                    min
                };
                let raw = c.position() + Vec2::new(angle.cos(), angle.sin()) * distance;
                let target = ctx.snapshot.bounds.clamp(raw, c.radius);
                rerolled = Some(target);
                target
            }
        };
        let speed = agent.effective_max_speed(ctx.now) * ctx.tuning.wander_speed_fraction;
        let mut decision =
            Decision::new(Behavior::Wander, steer_towards(c.position(), target, speed));
        decision.wander_target = rerolled;
        decision
    }
}
