//! Lateral lane offset and lane-change decisions.
use rand::Rng;
use rand::seq::SliceRandom;
use std::f64::consts::FRAC_PI_2;

use crate::constants::{LANE_CHANGE_CHANCE, LANE_WIDTH, MIN_SPEED};
use crate::geometry::Position;

/// Lane relative to the road center line; negative is left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneOffset(i32);

impl LaneOffset {
    #[must_use]
    pub const fn lanes(self) -> i32 {
        self.0
    }

    /// Pick a lane change for this tick: -1 left, +1 right, `None` to keep
    /// the lane. A commanded stop pulls over to the right lane.
    pub fn decide<R: Rng + ?Sized>(
        self,
        speed: f64,
        stop_commanded: bool,
        rng: &mut R,
    ) -> Option<i32> {
        if speed < MIN_SPEED {
            return None;
        }
        if stop_commanded {
            return (self.0 < 1).then_some(1);
        }
        if rng.gen_bool(LANE_CHANGE_CHANCE) {
            if self.0 == 0 {
                return [-1, 1].choose(rng).copied();
            }
            return Some(-self.0);
        }
        None
    }

    pub fn shift(&mut self, direction: i32) {
        self.0 += direction;
        log::debug!("lane offset now {}", self.0);
    }

    /// Position shifted sideways from the center line for display.
    #[must_use]
    pub fn apply(self, position: Position, heading: f64) -> Position {
        if self.0 == 0 {
            return position;
        }
        let side = if self.0 < 0 {
            heading + FRAC_PI_2
        } else {
            heading - FRAC_PI_2
        };
        position.advanced(side, f64::from(self.0.abs()) * LANE_WIDTH)
    }
}

/// Steering deflection that visualizes drifting one lane in `direction`
/// while covering `forward` meters.
#[must_use]
pub fn lane_change_steering(direction: i32, forward: f64) -> f64 {
    (f64::from(direction) * LANE_WIDTH).atan2(forward)
}
