//! Centralized tuning constants for the emulator core.
//!
//! These values define the deterministic math of the motion model. Keeping
//! them together means the driving behaviour can only be adjusted through
//! reviewed code changes, never through runtime input.

// Unit conversions ---------------------------------------------------------
pub(crate) const KMPH_TO_MPS: f64 = 0.277_777_777_777;
pub(crate) const MPS_TO_KMPH: f64 = 1.0 / KMPH_TO_MPS;
/// Degrees of latitude/longitude per projected meter.
pub const DEGREES_PER_METER: f64 = 0.000_008_998_719_243_599_958;

// Speed and acceleration envelope -------------------------------------------
/// Top speed in meters per second (about 90 km/h).
pub const MAX_SPEED: f64 = 25.0;
/// Minimum cruising speed in meters per second (about 10 km/h).
pub const MIN_SPEED: f64 = 2.777_777_10;
/// Cornering speed for a full reversal; must not be below `MIN_SPEED`.
pub const MAX_TURN_AROUND_SPEED: f64 = MIN_SPEED;
pub const MAX_ACCELERATION: f64 = 2.777_77;
pub const MIN_ACCELERATION: f64 = 0.5;
pub const MAX_BREAK: f64 = 4.0;
pub const MIN_BREAK: f64 = 1.0;
pub(crate) const INITIAL_SPEED: f64 = 0.0;

// Planning -------------------------------------------------------------------
pub const DEFAULT_PLAN_LENGTH: usize = 10;
/// Previous, current and next point.
pub const MIN_PLAN_LENGTH: usize = 3;
pub const MAX_PLAN_LENGTH: usize = 64;

// Driver ---------------------------------------------------------------------
pub const MADNESS_CHANGE_TICKS: u32 = 400;
pub const DEFAULT_MADNESS: f64 = 0.7;
pub(crate) const MADNESS_DRIFT_FLOOR: f64 = 0.5;

// Lanes and steering ---------------------------------------------------------
pub const LANE_WIDTH: f64 = 1.5;
pub(crate) const LANE_CHANGE_CHANCE: f64 = 0.01;
pub(crate) const STEERING_DISTANCE: f64 = 10.0;
pub(crate) const STEERING_WHEEL_RANGE: f64 = 530.0;

// Signals --------------------------------------------------------------------
pub(crate) const STOP_SIGNAL_BRAKE_THRESHOLD: f64 = 0.5;
pub const TURN_SIGNAL_TICKS: u32 = 8;
/// 50 degrees.
pub(crate) const TURN_SIGNAL_ANGLE_THRESHOLD: f64 = 0.872_664_625_997_164_8;
pub(crate) const TURN_SIGNAL_DISTANCE: f64 = 20.0;

// Fuel and odometer ----------------------------------------------------------
pub(crate) const FUEL_CONSUMPTION: f64 = 17.0;
pub(crate) const MIN_FUEL_CONSUMPTION: f64 = 4.0;
pub const DEFAULT_ODOMETER_M: f64 = 232_000.0;
pub const DEFAULT_GAS_RANGE_M: f64 = 423_000.0;
pub(crate) const GAS_RESERVE_M: f64 = 50_000.0;
pub(crate) const GAS_REFILL_M: f64 = 431_000.0;

// Engine ---------------------------------------------------------------------
pub(crate) const MIN_RPM: i32 = 800;
pub(crate) const SPEED_PER_GEAR: f64 = 5.1;
pub(crate) const TOP_GEAR: i32 = 5;

// Tire failure sequence ------------------------------------------------------
pub const REPLACE_TIRE_COUNTDOWN: u32 = 236;
pub const NOMINAL_TIRE_PRESSURE: f64 = 27.0;
pub(crate) const FLAT_TIRE_PRESSURE: f64 = 14.0;
pub(crate) const TIRE_DROOP_END: u32 = 180;
pub(crate) const TIRE_FORCE_STOP: u32 = 215;
pub(crate) const TIRE_DOOR_OPEN: u32 = 190;
pub(crate) const TIRE_DOOR_CLOSED: u32 = 180;
pub(crate) const TIRE_TRUNK_UNLOCKED: u32 = 165;
pub(crate) const TIRE_REFILL_START: u32 = 100;
pub(crate) const TIRE_REFILL_END: u32 = 74;
pub(crate) const TIRE_TRUNK_LOCKED: u32 = 35;
pub(crate) const TIRE_DOOR_REOPEN: u32 = 20;
pub(crate) const TIRE_DOOR_RECLOSED: u32 = 10;

// Geofence -------------------------------------------------------------------
pub const TEST_RECTANGLE_HALF_SIZE_M: f64 = 1_000.0;
