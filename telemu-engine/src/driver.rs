//! Simulated driver temperament ("madness") and the limits derived from it.
use rand::Rng;
use std::f64::consts::PI;

use crate::constants::{
    MADNESS_CHANGE_TICKS, MADNESS_DRIFT_FLOOR, MAX_ACCELERATION, MAX_BREAK, MAX_SPEED,
    MAX_TURN_AROUND_SPEED, MIN_ACCELERATION, MIN_BREAK, MIN_SPEED,
};
use crate::error::CommandError;

/// Driving style: speed, acceleration and braking limits scale with madness.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverProfile {
    madness: f64,
    max_speed: f64,
    max_acceleration: f64,
    max_break: f64,
    drift: bool,
    ticks_till_drift: u32,
}

impl DriverProfile {
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidMadness`] outside `(0, 1]`.
    pub fn new(madness: f64, drift: bool) -> Result<Self, CommandError> {
        let mut profile = Self {
            madness: MADNESS_DRIFT_FLOOR,
            max_speed: MAX_SPEED,
            max_acceleration: MAX_ACCELERATION,
            max_break: MAX_BREAK,
            drift,
            ticks_till_drift: MADNESS_CHANGE_TICKS,
        };
        profile.set_madness(madness)?;
        Ok(profile)
    }

    #[must_use]
    pub const fn madness(&self) -> f64 {
        self.madness
    }

    #[must_use]
    pub const fn max_speed(&self) -> f64 {
        self.max_speed
    }

    #[must_use]
    pub const fn max_acceleration(&self) -> f64 {
        self.max_acceleration
    }

    #[must_use]
    pub const fn max_break(&self) -> f64 {
        self.max_break
    }

    #[must_use]
    pub const fn drift_enabled(&self) -> bool {
        self.drift
    }

    #[must_use]
    pub const fn ticks_till_drift(&self) -> u32 {
        self.ticks_till_drift
    }

    /// Set madness, rederive the limits and restart the drift countdown.
    ///
    /// Callers holding plan points must rescore them afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidMadness`] outside `(0, 1]`; the
    /// profile is left untouched.
    pub fn set_madness(&mut self, madness: f64) -> Result<(), CommandError> {
        if !(madness > 0.0 && madness <= 1.0) {
            return Err(CommandError::InvalidMadness(madness));
        }
        self.madness = madness;
        self.max_speed = lerp(MIN_SPEED, MAX_SPEED, madness);
        self.max_acceleration = lerp(MIN_ACCELERATION, MAX_ACCELERATION, madness);
        self.max_break = lerp(MIN_BREAK, MAX_BREAK, madness);
        self.ticks_till_drift = MADNESS_CHANGE_TICKS;
        Ok(())
    }

    pub fn set_drift(&mut self, enabled: bool) {
        self.drift = enabled;
    }

    /// Count one tick of periodic drift. Returns true when madness changed.
    pub fn tick_drift<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if !self.drift {
            return false;
        }
        self.ticks_till_drift = self.ticks_till_drift.saturating_sub(1);
        if self.ticks_till_drift > 0 {
            return false;
        }
        let drawn: f64 = rng.r#gen();
        let madness = drawn.mul_add(1.0 - MADNESS_DRIFT_FLOOR, MADNESS_DRIFT_FLOOR);
        // drawn lies in [0, 1), so madness lies in [0.5, 1)
        if self.set_madness(madness).is_err() {
            self.ticks_till_drift = MADNESS_CHANGE_TICKS;
            return false;
        }
        log::debug!("driver madness drifted to {madness:.3}");
        true
    }

    /// Highest speed at which this driver takes a turn of `turn_angle`.
    #[must_use]
    pub fn max_turn_speed(&self, turn_angle: f64) -> f64 {
        let limit = (MAX_SPEED - MAX_TURN_AROUND_SPEED) * (1.0 - turn_angle.abs() / PI);
        (limit - MIN_SPEED).mul_add(self.madness, MIN_SPEED)
    }
}

fn lerp(min: f64, max: f64, weight: f64) -> f64 {
    (max - min).mul_add(weight, min).clamp(min, max)
}
