// Planar helpers shared by steering, ballistics and perception.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Axis-aligned playable area of a room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 500.0,
            max_y: 500.0,
        }
    }
}

impl WorldBounds {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.min_x < self.max_x
            && self.min_y < self.max_y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Clamps a point so that it stays at least `margin` away from every edge.
    ///
    /// When the margin does not fit on an axis the point collapses to that axis' center.
    pub fn clamp(&self, p: Vec2, margin: f32) -> Vec2 {
        let center = self.center();
        let x = if self.min_x + margin <= self.max_x - margin {
            p.x.clamp(self.min_x + margin, self.max_x - margin)
        } else {
            center.x
        };
        let y = if self.min_y + margin <= self.max_y - margin {
            p.y.clamp(self.min_y + margin, self.max_y - margin)
        } else {
            center.y
        };
        Vec2::new(x, y)
    }

    /// Uniform point at least `margin` away from every edge.
    pub fn random_point(&self, rng: &mut impl Rng, margin: f32) -> Vec2 {
        let p = Vec2::new(
            random_between(rng, self.min_x + margin, self.max_x - margin),
            random_between(rng, self.min_y + margin, self.max_y - margin),
        );
        self.clamp(p, margin)
    }
}

fn random_between(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..max)
    } else {
        (min + max) * 0.5
    }
}

/// Heading in radians from `from` towards `to` (0 = +X, counter-clockwise positive).
pub fn heading_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Normalizes an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

/// Absolute angular difference between two headings.
pub fn angle_between(a: f32, b: f32) -> f32 {
    wrap_angle(a - b).abs()
}

/// Turns `current` towards `target` by at most `max_step` radians.
pub fn rotate_towards(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = wrap_angle(target - current);
    if delta.abs() <= max_step {
        wrap_angle(target)
    } else {
        wrap_angle(current + max_step.copysign(delta))
    }
}

pub fn unit_from_heading(heading: f32) -> Vec2 {
    Vec2::new(heading.cos(), heading.sin())
}

/// Velocity that moves from `from` towards `to` at `speed`.
pub fn steer_towards(from: Vec2, to: Vec2, speed: f32) -> Vec2 {
    (to - from).normalize_or_zero() * speed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_margin_fits_then_clamp_keeps_point_inside_margin() {
        let bounds = WorldBounds::new(0.0, 0.0, 100.0, 100.0);
        let p = bounds.clamp(Vec2::new(-20.0, 150.0), 5.0);
        assert_eq!(p, Vec2::new(5.0, 95.0));
    }

    #[test]
    fn when_margin_too_large_then_clamp_uses_center() {
        let bounds = WorldBounds::new(0.0, 0.0, 10.0, 100.0);
        let p = bounds.clamp(Vec2::new(1.0, 50.0), 6.0);
        assert_eq!(p.x, 5.0);
        assert_eq!(p.y, 50.0);
    }

    #[test]
    fn when_target_close_then_rotate_snaps() {
        let h = rotate_towards(0.0, 0.1, 0.5);
        assert!((h - 0.1).abs() < 1e-6);
    }

    #[test]
    fn when_target_far_then_rotate_is_bounded_and_takes_short_way() {
        // From just below PI to just above -PI is a short counter-clockwise turn.
        let h = rotate_towards(3.0, -3.0, 0.1);
        assert!((wrap_angle(h - 3.1)).abs() < 1e-5);
    }

    #[test]
    fn when_random_point_drawn_then_it_respects_margin() {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let bounds = WorldBounds::new(0.0, 0.0, 20.0, 20.0);
        for _ in 0..100 {
            let p = bounds.random_point(&mut rng, 2.0);
            assert!(p.x >= 2.0 && p.x <= 18.0 && p.y >= 2.0 && p.y <= 18.0);
        }
    }

    #[test]
    fn when_bounds_inverted_then_invalid() {
        assert!(!WorldBounds::new(10.0, 0.0, 0.0, 10.0).is_valid());
        assert!(WorldBounds::default().is_valid());
    }
}
