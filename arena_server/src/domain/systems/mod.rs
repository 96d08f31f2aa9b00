// Per-tick systems that operate on the world.

pub mod kinematics;
pub mod projectiles;
