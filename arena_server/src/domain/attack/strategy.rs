use super::definition::{
    AttackCharacteristic, AttackDefinition, AttackEffect, AttackRejection, AttemptOutcome,
};
use super::queue::AttackState;
use crate::domain::combatant::{Combatant, TargetInfo};
use crate::domain::geometry::heading_to;
use crate::domain::tuning::projectile::ProjectileTuning;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub type SharedStrategy = Arc<dyn AttackStrategy>;

/// Shared contract for melee, ranged and combo attacks.
///
/// Strategies are stateless; anything that must survive between ticks (queued combo steps,
/// cast start) lives in the attacker's [`AttackState`].
pub trait AttackStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Total windup before the last step fires. Zero means the attack executes immediately.
    fn cast_time_ms(&self) -> u64;

    /// Center-to-center distance at which the attack can start against a target of the
    /// given radius.
    fn max_range(&self, attacker: &Combatant, target_radius: f32) -> f32;

    /// Steps committed when the attack is accepted.
    fn steps(&self, attacker: &Combatant) -> Vec<AttackDefinition>;

    fn can_execute(
        &self,
        attacker: &Combatant,
        target: &TargetInfo,
        now: u64,
    ) -> Result<(), AttackRejection> {
        attacker.can_attack(now)?;
        if !target.is_alive {
            return Err(AttackRejection::TargetDead);
        }
        if attacker.distance_to(target.position) > self.max_range(attacker, target.radius) {
            return Err(AttackRejection::OutOfRange);
        }
        Ok(())
    }

    /// Fires every step right now, ignoring windups.
    fn execute(
        &self,
        attacker: &mut Combatant,
        target: &TargetInfo,
        now: u64,
    ) -> Vec<AttackEffect> {
        let mut effects = Vec::new();
        for step in self.steps(attacker) {
            if let Some(effect) = step.resolve(attacker, Some(target.id), target.position) {
                effects.push(effect);
            }
            attacker.mark_attack(now, step.cooldown_ms);
        }
        effects
    }

    fn attempt_execute(
        &self,
        attacker: &mut Combatant,
        state: &mut AttackState,
        target: &TargetInfo,
        now: u64,
    ) -> AttemptOutcome {
        if let Err(reason) = self.can_execute(attacker, target, now) {
            return AttemptOutcome::rejected(reason);
        }

        let facing = heading_to(attacker.position(), target.position);
        if self.cast_time_ms() == 0 {
            attacker.heading = facing;
            return AttemptOutcome::executed(self.execute(attacker, target, now));
        }

        let steps = self.steps(attacker);
        state.begin_cast(self.name(), steps, now, Some(target.id), target.position, facing);
        attacker.is_attacking = true;
        AttemptOutcome::casting()
    }
}

/// Instant strike using the attacker's own damage and range.
#[derive(Debug, Clone)]
pub struct MeleeStrategy {
    pub name: String,
    pub damage: Option<i32>,
}

impl Default for MeleeStrategy {
    fn default() -> Self {
        Self {
            name: "melee".to_string(),
            damage: None,
        }
    }
}

impl AttackStrategy for MeleeStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn cast_time_ms(&self) -> u64 {
        0
    }

    fn max_range(&self, attacker: &Combatant, target_radius: f32) -> f32 {
        melee_range(attacker, target_radius)
    }

    fn steps(&self, attacker: &Combatant) -> Vec<AttackDefinition> {
        vec![AttackDefinition::melee(
            self.name.clone(),
            self.damage.unwrap_or(attacker.attack_damage),
            0,
        )]
    }
}

/// Cast-time projectile attack.
#[derive(Debug, Clone)]
pub struct RangedStrategy {
    pub name: String,
    pub cast_time_ms: u64,
    pub speed: f32,
    pub projectile_radius: f32,
    /// Explicit range; when absent it is derived from the launch ballistics.
    pub max_range: Option<f32>,
    pub damage: Option<i32>,
    pub cooldown_ms: Option<u64>,
    pub gravity: f32,
    pub reference_height: f32,
}

impl RangedStrategy {
    pub fn from_tuning(
        name: impl Into<String>,
        cast_time_ms: u64,
        tuning: &ProjectileTuning,
    ) -> Self {
        Self {
            name: name.into(),
            cast_time_ms,
            speed: tuning.speed,
            projectile_radius: tuning.radius,
            max_range: None,
            damage: None,
            cooldown_ms: None,
            gravity: tuning.gravity,
            reference_height: tuning.reference_height,
        }
    }

    pub fn effective_range(&self) -> f32 {
        self.max_range
            .unwrap_or_else(|| ballistic_range(self.speed, self.gravity, self.reference_height))
    }
}

/// Horizontal distance covered by a shot launched level from `height` before it lands.
pub fn ballistic_range(speed: f32, gravity: f32, height: f32) -> f32 {
    if gravity <= 0.0 || height <= 0.0 || speed <= 0.0 {
        return 0.0;
    }
    speed * (2.0 * height / gravity).sqrt()
}

impl AttackStrategy for RangedStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn cast_time_ms(&self) -> u64 {
        self.cast_time_ms
    }

    fn max_range(&self, _attacker: &Combatant, _target_radius: f32) -> f32 {
        self.effective_range()
    }

    fn steps(&self, attacker: &Combatant) -> Vec<AttackDefinition> {
        vec![AttackDefinition {
            name: self.name.clone(),
            damage: self.damage.unwrap_or(attacker.attack_damage),
            windup_ms: self.cast_time_ms,
            cooldown_ms: self.cooldown_ms,
            characteristic: AttackCharacteristic::Projectile {
                speed: self.speed,
                radius: self.projectile_radius,
                max_range: self.effective_range(),
            },
        }]
    }
}

/// Multi-step attack; each step keeps its own windup, damage and cooldown.
#[derive(Debug, Clone)]
pub struct ComboStrategy {
    pub name: String,
    pub steps: Vec<AttackDefinition>,
}

impl AttackStrategy for ComboStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn cast_time_ms(&self) -> u64 {
        self.steps.iter().map(|s| s.windup_ms).sum()
    }

    fn max_range(&self, attacker: &Combatant, target_radius: f32) -> f32 {
        // The combo opens with its first step, so that step decides the engagement range.
        match self.steps.first().map(|s| &s.characteristic) {
            Some(AttackCharacteristic::Projectile { max_range, .. }) => *max_range,
            Some(AttackCharacteristic::Area { radius }) => radius + target_radius,
            Some(AttackCharacteristic::Melee) | None => melee_range(attacker, target_radius),
        }
    }

    fn steps(&self, _attacker: &Combatant) -> Vec<AttackDefinition> {
        self.steps.clone()
    }
}

fn melee_range(attacker: &Combatant, target_radius: f32) -> f32 {
    attacker.attack_range + attacker.radius + target_radius
}

#[derive(Debug)]
pub enum StrategyError {
    EmptyCombo,
    InvalidSpeed,
    UnknownPreset(String),
}

/// Declarative strategy description, as found in map configs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    Preset {
        name: String,
    },
    Melee {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        damage: Option<i32>,
    },
    Ranged {
        #[serde(default)]
        name: Option<String>,
        cast_time_ms: u64,
        #[serde(default)]
        speed: Option<f32>,
        #[serde(default)]
        max_range: Option<f32>,
        #[serde(default)]
        damage: Option<i32>,
        #[serde(default)]
        cooldown_ms: Option<u64>,
    },
    Combo {
        name: String,
        steps: Vec<AttackDefinition>,
    },
}

impl StrategyConfig {
    pub fn preset(name: &str) -> Self {
        StrategyConfig::Preset {
            name: name.to_string(),
        }
    }

    pub fn build(&self, tuning: &ProjectileTuning) -> Result<SharedStrategy, StrategyError> {
        match self {
            StrategyConfig::Preset { name } => match name.as_str() {
                "melee" => Ok(Arc::new(MeleeStrategy::default())),
                "ranged" => Ok(Arc::new(RangedStrategy::from_tuning("ranged", 400, tuning))),
                "combo" => Ok(Arc::new(ComboStrategy {
                    name: "combo".to_string(),
                    steps: vec![
                        AttackDefinition::melee("slash", 8, 200),
                        AttackDefinition::melee("backslash", 10, 300),
                        AttackDefinition::melee("overhead", 16, 400).with_cooldown(2_000),
                    ],
                })),
                other => Err(StrategyError::UnknownPreset(other.to_string())),
            },
            StrategyConfig::Melee { name, damage } => Ok(Arc::new(MeleeStrategy {
                name: name.clone().unwrap_or_else(|| "melee".to_string()),
                damage: *damage,
            })),
            StrategyConfig::Ranged {
                name,
                cast_time_ms,
                speed,
                max_range,
                damage,
                cooldown_ms,
            } => {
                let mut ranged = RangedStrategy::from_tuning(
                    name.clone().unwrap_or_else(|| "ranged".to_string()),
                    *cast_time_ms,
                    tuning,
                );
                if let Some(speed) = speed {
                    if !speed.is_finite() || *speed <= 0.0 {
                        return Err(StrategyError::InvalidSpeed);
                    }
                    ranged.speed = *speed;
                }
                ranged.max_range = *max_range;
                ranged.damage = *damage;
                ranged.cooldown_ms = *cooldown_ms;
                Ok(Arc::new(ranged))
            }
            StrategyConfig::Combo { name, steps } => {
                if steps.is_empty() {
                    return Err(StrategyError::EmptyCombo);
                }
                Ok(Arc::new(ComboStrategy {
                    name: name.clone(),
                    steps: steps.clone(),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::combatant::test_support::combatant;
    use crate::domain::ids::EntityId;

    fn target_at(x: f32, y: f32) -> TargetInfo {
        combatant(EntityId::Player(7), x, y).target_info()
    }

    #[test]
    fn when_target_inside_melee_reach_then_melee_executes_immediately() {
        let mut mob = combatant(EntityId::Mob(1), 100.0, 100.0);
        let mut state = AttackState::default();
        let target = target_at(105.0, 100.0);

        let outcome = MeleeStrategy::default().attempt_execute(&mut mob, &mut state, &target, 0);

        assert!(outcome.can_execute && outcome.executed && !outcome.needs_casting);
        assert_eq!(
            outcome.effects,
            vec![AttackEffect::Strike {
                attacker: EntityId::Mob(1),
                target: EntityId::Player(7),
                damage: 10
            }]
        );
        assert_eq!(mob.last_attack_at, Some(0));
        assert!(state.queue.is_empty());
    }

    #[test]
    fn when_target_beyond_reach_then_attempt_is_rejected_with_reason() {
        let mut mob = combatant(EntityId::Mob(1), 0.0, 0.0);
        let mut state = AttackState::default();
        let target = target_at(50.0, 0.0);

        let outcome = MeleeStrategy::default().attempt_execute(&mut mob, &mut state, &target, 0);

        assert!(!outcome.can_execute);
        assert_eq!(outcome.rejection, Some(AttackRejection::OutOfRange));
    }

    #[test]
    fn when_range_not_configured_then_ballistic_range_is_used() {
        let tuning = ProjectileTuning::default();
        let mut ranged = RangedStrategy::from_tuning("bow", 400, &tuning);
        let derived = ballistic_range(tuning.speed, tuning.gravity, tuning.reference_height);
        assert!((ranged.effective_range() - derived).abs() < 1e-4);

        ranged.max_range = Some(42.0);
        assert_eq!(ranged.effective_range(), 42.0);
    }

    #[test]
    fn when_ranged_accepted_then_it_needs_casting_and_queues_one_step() {
        let mut archer = combatant(EntityId::Mob(1), 0.0, 0.0);
        let mut state = AttackState::default();
        let ranged = RangedStrategy::from_tuning("bow", 400, &ProjectileTuning::default());
        let target = target_at(5.0, 0.0);

        let outcome = ranged.attempt_execute(&mut archer, &mut state, &target, 1_000);

        assert!(outcome.needs_casting && !outcome.executed);
        assert!(state.is_casting);
        assert_eq!(state.queue.len(), 1);
        assert_eq!(state.queue[0].execution_time, 1_400);
    }

    #[test]
    fn when_combo_cast_time_requested_then_windups_are_summed() {
        let combo = ComboStrategy {
            name: "c".to_string(),
            steps: vec![
                AttackDefinition::melee("a", 1, 200),
                AttackDefinition::melee("b", 1, 300),
            ],
        };
        assert_eq!(combo.cast_time_ms(), 500);
    }

    #[test]
    fn when_config_is_empty_combo_then_build_fails() {
        let config = StrategyConfig::Combo {
            name: "empty".to_string(),
            steps: Vec::new(),
        };
        assert!(matches!(
            config.build(&ProjectileTuning::default()),
            Err(StrategyError::EmptyCombo)
        ));
    }

    #[test]
    fn when_preset_unknown_then_build_fails() {
        assert!(matches!(
            StrategyConfig::preset("fireball").build(&ProjectileTuning::default()),
            Err(StrategyError::UnknownPreset(_))
        ));
    }

    #[test]
    fn when_strategy_config_parsed_from_toml_then_fields_are_kept() {
        let config: StrategyConfig = toml::from_str(
            r#"
            type = "ranged"
            cast_time_ms = 250
            max_range = 30.0
            "#,
        )
        .expect("valid strategy toml");

        let strategy = config
            .build(&ProjectileTuning::default())
            .expect("strategy should build");
        assert_eq!(strategy.cast_time_ms(), 250);
        let c = combatant(EntityId::Mob(1), 0.0, 0.0);
        assert_eq!(strategy.max_range(&c, 1.0), 30.0);
    }
}
