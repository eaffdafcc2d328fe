//! Construction-time settings for a single emulated vehicle.
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_GAS_RANGE_M, DEFAULT_MADNESS, DEFAULT_ODOMETER_M, DEFAULT_PLAN_LENGTH,
    MAX_PLAN_LENGTH, MIN_PLAN_LENGTH,
};
use crate::error::ConfigError;
use crate::geofence::{GeoRect, GeofenceConfig};
use crate::graph::{RoadGraph, VertexId};

/// Emulator configuration, usually deserialized from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmulatorConfig {
    /// Lookahead window length.
    #[serde(default = "EmulatorConfig::default_plan_length")]
    pub plan_length: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "EmulatorConfig::default_initial_madness")]
    pub initial_madness: f64,
    #[serde(default = "EmulatorConfig::default_madness_drift")]
    pub madness_drift: bool,
    /// Random start when absent.
    #[serde(default)]
    pub start_vertex: Option<VertexId>,
    #[serde(default)]
    pub geofence: Option<GeofenceConfig>,
    #[serde(default = "EmulatorConfig::default_odometer_m")]
    pub odometer_m: f64,
    #[serde(default = "EmulatorConfig::default_gas_range_m")]
    pub gas_range_m: f64,
}

impl EmulatorConfig {
    #[must_use]
    pub const fn default_plan_length() -> usize {
        DEFAULT_PLAN_LENGTH
    }

    #[must_use]
    pub const fn default_initial_madness() -> f64 {
        DEFAULT_MADNESS
    }

    #[must_use]
    pub const fn default_madness_drift() -> bool {
        true
    }

    #[must_use]
    pub const fn default_odometer_m() -> f64 {
        DEFAULT_ODOMETER_M
    }

    #[must_use]
    pub const fn default_gas_range_m() -> f64 {
        DEFAULT_GAS_RANGE_M
    }

    /// Parse a JSON configuration document; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error for malformed input.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate configuration invariants that do not depend on the graph.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_plan_length()?;
        self.validate_initial_madness()?;
        validate_non_negative("odometer_m", self.odometer_m)?;
        validate_non_negative("gas_range_m", self.gas_range_m)?;
        if let Some(geofence) = &self.geofence {
            GeoRect::new(geofence.rectangle.corner0, geofence.rectangle.corner1)?;
        }
        Ok(())
    }

    /// Validate the configuration, including references into `graph`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for invalid bounds or an unknown start vertex.
    pub fn validate_for(&self, graph: &RoadGraph) -> Result<(), ConfigError> {
        self.validate()?;
        if let Some(start) = self.start_vertex
            && !graph.contains(start)
        {
            return Err(ConfigError::UnknownStartVertex(start));
        }
        Ok(())
    }

    fn validate_plan_length(&self) -> Result<(), ConfigError> {
        check_plan_length(self.plan_length)
    }

    fn validate_initial_madness(&self) -> Result<(), ConfigError> {
        // lower bound is exclusive
        if !(self.initial_madness > 0.0 && self.initial_madness <= 1.0) {
            return Err(ConfigError::RangeViolation {
                field: "initial_madness",
                min: 0.0,
                max: 1.0,
                value: self.initial_madness,
            });
        }
        Ok(())
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(ConfigError::RangeViolation {
            field,
            min: 0.0,
            max: f64::MAX,
            value,
        });
    }
    Ok(())
}

/// Lookahead window length must stay within the supported bounds.
pub(crate) fn check_plan_length(length: usize) -> Result<(), ConfigError> {
    if !(MIN_PLAN_LENGTH..=MAX_PLAN_LENGTH).contains(&length) {
        return Err(ConfigError::RangeViolation {
            field: "plan_length",
            min: count_as_f64(MIN_PLAN_LENGTH),
            max: count_as_f64(MAX_PLAN_LENGTH),
            value: count_as_f64(length),
        });
    }
    Ok(())
}

fn count_as_f64(value: usize) -> f64 {
    num_traits::cast::cast::<usize, f64>(value).unwrap_or(f64::MAX)
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            plan_length: Self::default_plan_length(),
            seed: 0,
            initial_madness: Self::default_initial_madness(),
            madness_drift: Self::default_madness_drift(),
            start_vertex: None,
            geofence: None,
            odometer_m: Self::default_odometer_m(),
            gas_range_m: Self::default_gas_range_m(),
        }
    }
}
