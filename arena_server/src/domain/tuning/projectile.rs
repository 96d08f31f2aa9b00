/// Gameplay tuning for projectiles.

#[derive(Debug, Clone, Copy)]
pub struct ProjectileTuning {
    /// Default launch speed in units per second.
    pub speed: f32,

    /// Global speed cap applied at launch and re-applied every tick.
    pub max_speed: f32,

    /// World-space collision radius.
    pub radius: f32,

    /// How long a projectile may stay stuck on a boundary before despawning.
    pub stuck_lifetime_ms: u64,

    /// Gravity and launch height used to derive a range when none is configured.
    pub gravity: f32,
    pub reference_height: f32,

    /// Half-angle of the deflector's facing cone, in degrees.
    pub deflect_cone_deg: f32,

    /// Velocity multiplier applied on deflection.
    pub deflect_boost: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 20.0,
            max_speed: 40.0,
            radius: 0.5,
            stuck_lifetime_ms: 2_000,
            gravity: 9.81,
            reference_height: 4.0,
            deflect_cone_deg: 60.0,
            deflect_boost: 1.5,
        }
    }
}
