/// Gameplay tuning for the AI decision module and its default policies.

#[derive(Debug, Clone, Copy)]
pub struct AiTuning {
    /// Decision passes per second, independent of the tick rate.
    pub decision_rate_hz: u32,

    /// Distance from an edge (on top of the agent radius) that triggers boundary avoidance.
    pub boundary_buffer: f32,
    pub boundary_lock_ms: u64,

    /// Hold position when within this fraction of the best attack range.
    pub attack_hold_fraction: f32,
    pub attack_lock_ms: u64,

    pub chase_radius: f32,
    /// Inside this distance chase speed drops to `stopping_speed_fraction` of max speed.
    pub chase_stopping_distance: f32,
    pub stopping_speed_fraction: f32,

    pub wander_min_distance: f32,
    pub wander_max_distance: f32,
    pub wander_refresh_ms: u64,
    pub wander_arrival_distance: f32,
    pub wander_speed_fraction: f32,

    /// How far the perception query looks for opponents.
    pub perception_range: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            decision_rate_hz: 20,
            boundary_buffer: 5.0,
            boundary_lock_ms: 200,
            attack_hold_fraction: 0.8,
            attack_lock_ms: 500,
            chase_radius: 25.0,
            chase_stopping_distance: 3.0,
            stopping_speed_fraction: 0.2,
            wander_min_distance: 200.0,
            wander_max_distance: 250.0,
            wander_refresh_ms: 8_000,
            wander_arrival_distance: 5.0,
            wander_speed_fraction: 0.6,
            perception_range: 60.0,
        }
    }
}
