// Attack strategies and the per-entity casting/queue state machine.

pub mod definition;
pub mod queue;
pub mod strategy;

pub use definition::{
    AttackCharacteristic, AttackDefinition, AttackEffect, AttackRejection, AttemptOutcome,
    ProjectileLaunch,
};
pub use queue::{
    AttackState, AttackTick, QueuedAttack, tick_attack_state, try_attack, update_attacker,
};
pub use strategy::{
    AttackStrategy, ComboStrategy, MeleeStrategy, RangedStrategy, SharedStrategy, StrategyConfig,
    StrategyError,
};
