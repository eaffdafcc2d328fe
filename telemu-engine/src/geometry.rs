//! Plane geometry shared by the planner and the kinematic model.
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Point on the projected plane, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Heading from `self` towards `other`, in radians.
    #[must_use]
    pub fn heading_to(self, other: Self) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Move `distance` meters along `heading`.
    #[must_use]
    pub fn advanced(self, heading: f64, distance: f64) -> Self {
        Self {
            x: self.x + heading.cos() * distance,
            y: self.y + heading.sin() * distance,
        }
    }
}

/// Wrap an angle difference into (-pi, pi].
#[must_use]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(2.0 * PI);
    if wrapped > PI { wrapped - 2.0 * PI } else { wrapped }
}

/// Signed turn at `cur` when travelling `prev -> cur -> next`.
///
/// Positive values are right turns, negative values left turns.
#[must_use]
pub fn turn_angle(prev: Position, cur: Position, next: Position) -> f64 {
    normalize_angle(prev.heading_to(cur) - cur.heading_to(next))
}

/// Fraction of a turn already applied to the wheel `distance` meters before
/// the vertex: a Gaussian bell of width `sigma`, 1.0 at the vertex itself.
#[must_use]
pub fn steering_fraction(distance: f64, sigma: f64) -> f64 {
    let x = distance * 2.0;
    (-(x * x) / (2.0 * sigma * sigma)).exp()
}
