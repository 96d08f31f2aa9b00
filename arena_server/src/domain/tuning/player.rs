use crate::domain::combatant::CombatProfile;

/// Gameplay tuning for players.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).
#[derive(Debug, Clone)]
pub struct PlayerTuning {
    pub profile: CombatProfile,

    /// Rotation speed in radians per second while casting.
    pub turn_rate: f32,

    /// Delay before a dead player is respawned.
    pub respawn_ms: u64,

    /// Strategy preset names, in preference order.
    pub strategies: Vec<String>,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            profile: CombatProfile {
                max_health: 120,
                defense: 2,
                armor: 2,
                attack_damage: 12,
                attack_range: 2.5,
                attack_delay_ms: 600,
                radius: 1.0,
                max_move_speed: 8.0,
                invulnerability_ms: 150,
            },
            turn_rate: 10.0,
            respawn_ms: 3_000,
            strategies: vec!["melee".to_string(), "ranged".to_string()],
        }
    }
}
