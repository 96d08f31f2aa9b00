use crate::domain::attack::StrategyConfig;
use crate::domain::combatant::CombatProfile;
use serde::{Deserialize, Serialize};

/// A strategy candidate with its spawn weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedStrategy {
    #[serde(default = "default_weight")]
    pub weight: u32,
    pub strategy: StrategyConfig,
}

/// Gameplay tuning for one kind of mob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobArchetype {
    pub name: String,

    /// Relative spawn weight among the map's archetypes.
    #[serde(default = "default_weight")]
    pub weight: u32,

    pub profile: CombatProfile,

    /// Candidate loadouts; one is picked per spawned mob by weight.
    pub strategies: Vec<WeightedStrategy>,

    /// Rotation speed in radians per second while casting.
    #[serde(default = "default_turn_rate")]
    pub turn_rate: f32,

    /// Mobs of this kind cannot be revived by a respawn action.
    #[serde(default)]
    pub cant_respawn: bool,
}

fn default_weight() -> u32 {
    1
}

fn default_turn_rate() -> f32 {
    6.0
}

/// Built-in roster used when no map config is provided.
pub fn default_archetypes() -> Vec<MobArchetype> {
    vec![
        MobArchetype {
            name: "grunt".to_string(),
            weight: 5,
            profile: CombatProfile {
                max_health: 40,
                defense: 1,
                armor: 0,
                attack_damage: 6,
                attack_range: 2.0,
                attack_delay_ms: 900,
                radius: 1.0,
                max_move_speed: 5.0,
                invulnerability_ms: 100,
            },
            strategies: vec![WeightedStrategy {
                weight: 1,
                strategy: StrategyConfig::preset("melee"),
            }],
            turn_rate: 6.0,
            cant_respawn: false,
        },
        MobArchetype {
            name: "archer".to_string(),
            weight: 3,
            profile: CombatProfile {
                max_health: 30,
                defense: 0,
                armor: 1,
                attack_damage: 8,
                attack_range: 2.0,
                attack_delay_ms: 1_500,
                radius: 0.9,
                max_move_speed: 4.5,
                invulnerability_ms: 100,
            },
            strategies: vec![WeightedStrategy {
                weight: 1,
                strategy: StrategyConfig::preset("ranged"),
            }],
            turn_rate: 4.0,
            cant_respawn: false,
        },
        MobArchetype {
            name: "brute".to_string(),
            weight: 1,
            profile: CombatProfile {
                max_health: 90,
                defense: 3,
                armor: 3,
                attack_damage: 12,
                attack_range: 2.5,
                attack_delay_ms: 1_200,
                radius: 1.6,
                max_move_speed: 3.5,
                invulnerability_ms: 100,
            },
            strategies: vec![
                WeightedStrategy {
                    weight: 2,
                    strategy: StrategyConfig::preset("combo"),
                },
                WeightedStrategy {
                    weight: 1,
                    strategy: StrategyConfig::preset("melee"),
                },
            ],
            turn_rate: 3.0,
            cant_respawn: false,
        },
    ]
}
