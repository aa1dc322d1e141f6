//! Planar vector math for positions and velocities.
//!
//! Arena coordinates are integers on the wire but velocities are
//! fractional, so everything is carried as `f64`.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// 2D vector in arena space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Vec2 {
    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let d = other - self;
        d.x * d.x + d.y * d.y
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Round to the nearest integer coordinates, as sent over the wire.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn round_to_i64(self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dot_sign_for_approach() {
        // Relative position and velocity pointing at each other.
        let rel_pos = Vec2::new(50.0, 0.0);
        let rel_vel = Vec2::new(-8.0, 0.0);
        assert!(rel_vel.dot(rel_pos) < 0.0);
    }

    #[test]
    fn test_round_to_i64() {
        assert_eq!(Vec2::new(1.4, -2.6).round_to_i64(), (1, -3));
    }

    #[test]
    fn test_ops() {
        let v = Vec2::new(1.0, 2.0) + Vec2::new(3.0, 4.0) - Vec2::new(1.0, 1.0);
        assert_eq!(v * 2.0, Vec2::new(6.0, 10.0));
    }
}
