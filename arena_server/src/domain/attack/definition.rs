use crate::domain::combatant::Combatant;
use crate::domain::geometry::steer_towards;
use crate::domain::ids::EntityId;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// What an executed attack step produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttackCharacteristic {
    /// Direct hit on the step's target, resolved by the battle module.
    Melee,
    /// Moving hit volume launched towards the aim point.
    Projectile {
        speed: f32,
        radius: f32,
        max_range: f32,
    },
    /// Hits every opposing entity around the attacker.
    Area { radius: f32 },
}

/// One attack step. Combos are ordered lists of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackDefinition {
    pub name: String,
    pub damage: i32,
    /// Windup before this step fires, relative to the previous step.
    #[serde(default)]
    pub windup_ms: u64,
    /// Cooldown applied after this step; `None` falls back to the entity's base delay.
    #[serde(default)]
    pub cooldown_ms: Option<u64>,
    pub characteristic: AttackCharacteristic,
}

impl AttackDefinition {
    pub fn melee(name: impl Into<String>, damage: i32, windup_ms: u64) -> Self {
        Self {
            name: name.into(),
            damage,
            windup_ms,
            cooldown_ms: None,
            characteristic: AttackCharacteristic::Melee,
        }
    }

    pub fn with_cooldown(mut self, cooldown_ms: u64) -> Self {
        self.cooldown_ms = Some(cooldown_ms);
        self
    }

    /// Builds the effect of this step. Melee steps without a target are plain swings.
    pub fn resolve(
        &self,
        attacker: &Combatant,
        target: Option<EntityId>,
        aim_point: Vec2,
    ) -> Option<AttackEffect> {
        match &self.characteristic {
            AttackCharacteristic::Melee => target.map(|target| AttackEffect::Strike {
                attacker: attacker.id,
                target,
                damage: self.damage,
            }),
            AttackCharacteristic::Projectile {
                speed,
                radius,
                max_range,
            } => {
                let origin = attacker.position();
                // Spawn at the attacker's edge so the shot does not start inside its owner.
                let dir = steer_towards(origin, aim_point, 1.0);
                Some(AttackEffect::Projectile(ProjectileLaunch {
                    owner: attacker.id,
                    origin: origin + dir * attacker.radius,
                    aim_point,
                    speed: *speed,
                    damage: self.damage,
                    radius: *radius,
                    max_range: *max_range,
                }))
            }
            AttackCharacteristic::Area { radius } => Some(AttackEffect::Area {
                attacker: attacker.id,
                center: attacker.position(),
                radius: *radius,
                damage: self.damage,
            }),
        }
    }
}

/// Why an attack was not started. Diagnostic only; rejections are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackRejection {
    AttackerDead,
    TargetDead,
    MissingTarget,
    OutOfRange,
    OnCooldown,
    Stunned,
    Busy,
    NoStrategy,
}

impl AttackRejection {
    pub fn as_str(self) -> &'static str {
        match self {
            AttackRejection::AttackerDead => "attacker dead",
            AttackRejection::TargetDead => "target dead",
            AttackRejection::MissingTarget => "missing target",
            AttackRejection::OutOfRange => "out of range",
            AttackRejection::OnCooldown => "on cooldown",
            AttackRejection::Stunned => "stunned",
            AttackRejection::Busy => "busy casting",
            AttackRejection::NoStrategy => "no strategy",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileLaunch {
    pub owner: EntityId,
    pub origin: Vec2,
    pub aim_point: Vec2,
    pub speed: f32,
    pub damage: i32,
    pub radius: f32,
    pub max_range: f32,
}

/// Side effects of executed steps, applied by the room after the update.
#[derive(Debug, Clone, PartialEq)]
pub enum AttackEffect {
    Strike {
        attacker: EntityId,
        target: EntityId,
        damage: i32,
    },
    Projectile(ProjectileLaunch),
    Area {
        attacker: EntityId,
        center: Vec2,
        radius: f32,
        damage: i32,
    },
}

/// Result of `attempt_execute`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttemptOutcome {
    pub can_execute: bool,
    pub needs_casting: bool,
    pub executed: bool,
    pub rejection: Option<AttackRejection>,
    pub effects: Vec<AttackEffect>,
}

impl AttemptOutcome {
    pub fn rejected(reason: AttackRejection) -> Self {
        Self {
            rejection: Some(reason),
            ..Self::default()
        }
    }

    pub fn executed(effects: Vec<AttackEffect>) -> Self {
        Self {
            can_execute: true,
            executed: true,
            effects,
            ..Self::default()
        }
    }

    pub fn casting() -> Self {
        Self {
            can_execute: true,
            needs_casting: true,
            ..Self::default()
        }
    }
}
