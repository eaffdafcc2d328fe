//! Dashboard instruments backed by smoothed random signals.
use rand::Rng;
use std::f64::consts::PI;
use std::path::Path;

use crate::constants::STEERING_WHEEL_RANGE;
use crate::numbers::trunc_to_i32;
use crate::signal::{FileOverride, OverrideSource, SmoothedSignal};

const OIL_PRESSURE: f64 = 249.0;
const OIL_TEMPERATURE: f64 = 95.0;
const BATTERY_VOLTAGE: f64 = 11.52;
const OUTSIDE_TEMPERATURE: f64 = 20.0;
const INTERIOR_TEMPERATURE: f64 = 22.0;
const WIPER: f64 = 2.0;
const INTENSITY: f64 = 4.0;

/// File names looked up in an override directory.
pub const WIPER_OVERRIDE: &str = "wiper";
pub const INTENSITY_OVERRIDE: &str = "intensity";

/// Values sampled on the most recent tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InstrumentReadings {
    /// Steering wheel angle in wheel units, jitter included.
    pub steering_wheel: f64,
    pub oil_pressure: f64,
    pub oil_temperature: f64,
    pub battery_voltage: f64,
    pub outside_temperature: f64,
    pub interior_temperature: f64,
    pub wiper: f64,
    pub intensity: f64,
}

#[derive(Debug)]
pub struct InstrumentPanel {
    steering_wheel: SmoothedSignal,
    oil_pressure: SmoothedSignal,
    oil_temperature: SmoothedSignal,
    battery_voltage: SmoothedSignal,
    outside_temperature: SmoothedSignal,
    interior_temperature: SmoothedSignal,
    wiper: SmoothedSignal,
    intensity: SmoothedSignal,
    readings: InstrumentReadings,
}

impl InstrumentPanel {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut panel = Self {
            steering_wheel: SmoothedSignal::new(-10.0, 10.0, rng),
            oil_pressure: SmoothedSignal::new(-5.0, 5.0, rng),
            oil_temperature: SmoothedSignal::new(-4.0, 4.0, rng),
            battery_voltage: SmoothedSignal::new(-0.5, 0.5, rng),
            outside_temperature: SmoothedSignal::new(-1.0, 1.0, rng),
            interior_temperature: SmoothedSignal::new(-1.0, 1.0, rng),
            wiper: SmoothedSignal::new(-2.0, 2.0, rng),
            intensity: SmoothedSignal::new(-4.0, 4.0, rng),
            readings: InstrumentReadings::default(),
        };
        panel.sample(0.0, rng);
        panel
    }

    /// Poll `wiper` and `intensity` files inside `dir` on every sample.
    pub fn watch_dir(&mut self, dir: &Path) {
        self.set_wiper_override(Box::new(FileOverride::in_dir(dir, WIPER_OVERRIDE)));
        self.set_intensity_override(Box::new(FileOverride::in_dir(dir, INTENSITY_OVERRIDE)));
        log::info!("instrument overrides read from {}", dir.display());
    }

    pub fn set_wiper_override(&mut self, source: Box<dyn OverrideSource>) {
        self.wiper.set_override(source);
    }

    pub fn set_intensity_override(&mut self, source: Box<dyn OverrideSource>) {
        self.intensity.set_override(source);
    }

    /// Advance every signal once; `steering_angle` is in radians.
    pub fn sample<R: Rng + ?Sized>(&mut self, steering_angle: f64, rng: &mut R) {
        let wheel = f64::from(trunc_to_i32(steering_angle / PI * STEERING_WHEEL_RANGE));
        self.readings = InstrumentReadings {
            steering_wheel: self.steering_wheel.read(wheel, rng),
            oil_pressure: self.oil_pressure.read(OIL_PRESSURE, rng),
            oil_temperature: self.oil_temperature.read(OIL_TEMPERATURE, rng),
            battery_voltage: self.battery_voltage.read(BATTERY_VOLTAGE, rng),
            outside_temperature: self.outside_temperature.read(OUTSIDE_TEMPERATURE, rng),
            interior_temperature: self.interior_temperature.read(INTERIOR_TEMPERATURE, rng),
            wiper: self.wiper.read(WIPER, rng),
            intensity: self.intensity.read(INTENSITY, rng),
        };
    }

    #[must_use]
    pub const fn readings(&self) -> &InstrumentReadings {
        &self.readings
    }
}
