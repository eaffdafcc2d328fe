//! Vehicle emulator: owns the graph, the plan and the vehicle, and exposes
//! the tick and command contract used by drivers.
use std::path::Path;

use crate::config::EmulatorConfig;
use crate::driver::DriverProfile;
use crate::error::{CommandError, ConfigError, EmulatorError};
use crate::geofence::{GeoRect, Geofence};
use crate::geometry::Position;
use crate::graph::{GeoPoint, RoadGraph};
use crate::indicator::TurnSignal;
use crate::instruments::InstrumentPanel;
use crate::kinematics::{KinematicEngine, VehicleState};
use crate::numbers::{round_to_i32, trunc_to_i32};
use crate::planner::LookaheadPlanner;
use crate::rng::RngBundle;
use crate::telemetry::{CabinStatus, Telemetry};

#[derive(Debug)]
pub struct VehicleEmulator {
    graph: RoadGraph,
    planner: LookaheadPlanner,
    engine: KinematicEngine,
    geofence: Geofence,
    instruments: InstrumentPanel,
    rngs: RngBundle,
}

impl VehicleEmulator {
    /// Build an emulator on `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`EmulatorError::Config`] when `config` fails validation
    /// against the graph.
    pub fn new(graph: RoadGraph, config: &EmulatorConfig) -> Result<Self, EmulatorError> {
        config.validate_for(&graph)?;
        let profile = DriverProfile::new(config.initial_madness, config.madness_drift).map_err(
            |_| ConfigError::RangeViolation {
                field: "initial_madness",
                min: 0.0,
                max: 1.0,
                value: config.initial_madness,
            },
        )?;

        let mut rngs = RngBundle::from_user_seed(config.seed);
        let mut geofence = Geofence::from_config(config.geofence);
        let planner = LookaheadPlanner::new(
            &graph,
            config.plan_length,
            config.start_vertex,
            &profile,
            &mut geofence,
            rngs.route(),
        )?;
        let start = planner.prev().vertex;
        let reachable = graph.reachable_from(start);
        if reachable < graph.len() {
            log::warn!(
                "map is disconnected: only {reachable} of {} vertices reachable from vertex {start}",
                graph.len()
            );
        }
        let state = VehicleState::at_start(&graph, &planner, config.odometer_m, config.gas_range_m);
        let instruments = InstrumentPanel::new(rngs.instruments());

        log::info!(
            "emulator ready on {} vertices, starting at vertex {start}",
            graph.len()
        );
        Ok(Self {
            graph,
            planner,
            engine: KinematicEngine::new(state, profile),
            geofence,
            instruments,
            rngs,
        })
    }

    /// Convenience constructor from a graph document in JSON.
    ///
    /// # Errors
    ///
    /// Returns graph loading or configuration errors.
    pub fn from_json(graph_json: &str, config: &EmulatorConfig) -> Result<Self, EmulatorError> {
        let graph = RoadGraph::from_json(graph_json)?;
        Self::new(graph, config)
    }

    /// Read wiper and intensity overrides from files in `dir`.
    pub fn watch_overrides(&mut self, dir: &Path) {
        self.instruments.watch_dir(dir);
    }

    /// Advance simulated time by `dt` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidTimeStep`] unless `dt` is positive and
    /// finite; state is not touched in that case.
    pub fn update(&mut self, dt: f64) -> Result<(), CommandError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(CommandError::InvalidTimeStep(dt));
        }
        self.engine.step(
            dt,
            &self.graph,
            &mut self.planner,
            &mut self.geofence,
            &mut self.rngs,
        );
        self.instruments
            .sample(self.engine.state().steering(), self.rngs.instruments());
        Ok(())
    }

    /// Resume driving. Refused while a tire failure is being handled.
    pub fn start(&mut self) -> bool {
        let state = self.engine.state_mut();
        if state.tire.is_broken() {
            log::warn!("start refused: tire failure in progress");
            return false;
        }
        state.stop_commanded = false;
        log::info!("driving resumed");
        true
    }

    /// Pull over and stop. Always accepted.
    pub fn stop(&mut self) -> bool {
        self.engine.state_mut().stop_commanded = true;
        log::info!("stop commanded");
        true
    }

    /// Start the tire failure sequence unless one is already running.
    pub fn break_tire(&mut self) -> bool {
        let accepted = self.engine.state_mut().tire.try_break();
        if accepted {
            log::info!("tire broken");
        } else {
            log::warn!("tire break refused: failure already in progress");
        }
        accepted
    }

    /// Fix the driver's madness; turn speeds across the window follow.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidMadness`] outside `(0, 1]`.
    pub fn set_madness(&mut self, madness: f64) -> Result<(), CommandError> {
        if let Err(err) = self.engine.profile_mut().set_madness(madness) {
            log::warn!("{err}");
            return Err(err);
        }
        self.planner.rescore(self.engine.profile());
        log::info!("madness set to {madness}");
        Ok(())
    }

    pub fn set_madness_drift(&mut self, enabled: bool) {
        self.engine.profile_mut().set_drift(enabled);
        log::info!("periodic madness drift {}", if enabled { "on" } else { "off" });
    }

    /// Set the geofence rectangle from two opposite corners.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidRectangle`] for non-finite or
    /// degenerate corners; the current geofence is kept.
    pub fn set_geofence(&mut self, corner0: GeoPoint, corner1: GeoPoint) -> Result<(), CommandError> {
        let rectangle = GeoRect::new(corner0, corner1).inspect_err(|err| log::warn!("{err}"))?;
        self.geofence.set_rectangle(rectangle);
        log::info!(
            "geofence set to {:.6}:{:.6} {:.6}:{:.6}",
            corner0.longitude,
            corner0.latitude,
            corner1.longitude,
            corner1.latitude
        );
        Ok(())
    }

    pub fn clear_geofence(&mut self) {
        self.geofence.clear();
        log::info!("geofence cleared");
    }

    /// Steer into (`true`) or out of the geofence rectangle.
    pub fn set_geofence_direction(&mut self, into_rectangle: bool) {
        self.geofence.set_direction(into_rectangle);
        log::info!(
            "geofence direction: {}",
            if into_rectangle { "into" } else { "out of" }
        );
    }

    /// Geofence square centered on the vehicle, `half_size_m` meters to each side.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidRectangle`] unless `half_size_m` is a
    /// positive finite distance.
    pub fn test_rectangle(&mut self, half_size_m: f64) -> Result<(), CommandError> {
        if !(half_size_m.is_finite() && half_size_m > 0.0) {
            return Err(CommandError::InvalidRectangle);
        }
        let center = self.engine.state().display_position();
        let corner0 = Position::new(center.x - half_size_m, center.y - half_size_m);
        let corner1 = Position::new(center.x + half_size_m, center.y + half_size_m);
        self.set_geofence(self.graph.to_geo(corner0), self.graph.to_geo(corner1))
    }

    #[must_use]
    pub const fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    #[must_use]
    pub const fn planner(&self) -> &LookaheadPlanner {
        &self.planner
    }

    #[must_use]
    pub const fn state(&self) -> &VehicleState {
        self.engine.state()
    }

    #[must_use]
    pub const fn profile(&self) -> &DriverProfile {
        self.engine.profile()
    }

    #[must_use]
    pub const fn geofence(&self) -> &Geofence {
        &self.geofence
    }

    /// Displayed vehicle location.
    #[must_use]
    pub fn location(&self) -> GeoPoint {
        self.graph.to_geo(self.engine.state().display_position())
    }

    /// Full telemetry record for the end of the last tick.
    #[must_use]
    pub fn snapshot(&self) -> Telemetry {
        let state = self.engine.state();
        let tire = state.tire();
        let signal = state.turn_signal();
        let readings = self.instruments.readings();
        let location = self.location();
        let rectangle = self.geofence.rectangle();
        let speed_kmph = state.speed_kmph();

        Telemetry {
            lat: location.latitude,
            lon: location.longitude,
            veh_speed: speed_kmph,
            vehspddisp: speed_kmph,
            engrpm: state.rpm(),
            gr: state.gear(),
            odo: state.odometer_km(),
            gas_range: state.gas_range_km(),
            avgfuellvl: state.fuel_level(),
            brk_stat: u8::from(state.brake_light()),
            hazard_status: signal == TurnSignal::Emergency,
            turnind_lt_on: signal == TurnSignal::Left,
            turnind_rt_on: signal == TurnSignal::Right,
            turnindlvr_stat: signal.lever_code(),
            lrw: trunc_to_i32(readings.steering_wheel),
            tirepressrl: round_to_i32(tire.pressure()),
            drv_ajar: tire.driver_door_ajar(),
            drv_seatbelt: u8::from(tire.seatbelt_unfastened()),
            rr_dr_unlkd: tire.rear_door_unlocked(),
            oil_press: round_to_i32(readings.oil_pressure),
            engoiltemp: round_to_i32(readings.oil_temperature),
            batt_volt: round_to_i32(readings.battery_voltage),
            airtemp_outsd: round_to_i32(readings.outside_temperature),
            veh_int_temp: round_to_i32(readings.interior_temperature),
            wiper: round_to_i32(readings.wiper),
            intensity: round_to_i32(readings.intensity),
            fuel_consumption: state.fuel_consumption(),
            move_to_rectangle: self.geofence.into_rectangle(),
            in_rectangle: self.geofence.contains(location),
            rectangle_long0: rectangle.map(|r| r.corner0.longitude),
            rectangle_lat0: rectangle.map(|r| r.corner0.latitude),
            rectangle_long1: rectangle.map(|r| r.corner1.longitude),
            rectangle_lat1: rectangle.map(|r| r.corner1.latitude),
            cabin: CabinStatus::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{REPLACE_TIRE_COUNTDOWN, TEST_RECTANGLE_HALF_SIZE_M};

    const GRID: &str = r#"{
        "min_latitude": 52.0,
        "min_longitude": 13.0,
        "vertices": [
            {"id": 1, "x": 0.0, "y": 0.0, "neighbours": [2, 3]},
            {"id": 2, "x": 300.0, "y": 0.0, "neighbours": [1, 4]},
            {"id": 3, "x": 0.0, "y": 300.0, "neighbours": [1, 4]},
            {"id": 4, "x": 300.0, "y": 300.0, "neighbours": [2, 3]}
        ]
    }"#;

    fn emulator() -> VehicleEmulator {
        let config = EmulatorConfig {
            seed: 42,
            ..EmulatorConfig::default()
        };
        VehicleEmulator::from_json(GRID, &config).unwrap()
    }

    #[test]
    fn rejects_non_positive_time_steps() {
        let mut emu = emulator();
        for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(emu.update(dt), Err(CommandError::InvalidTimeStep(_))));
        }
        assert_eq!(emu.state().ticks(), 0);
    }

    #[test]
    fn unknown_start_vertex_is_a_config_error() {
        let config = EmulatorConfig {
            start_vertex: Some(99),
            ..EmulatorConfig::default()
        };
        let err = VehicleEmulator::from_json(GRID, &config).unwrap_err();
        assert!(matches!(
            err,
            EmulatorError::Config(ConfigError::UnknownStartVertex(99))
        ));
    }

    #[test]
    fn disconnected_map_keeps_the_vehicle_in_its_component() {
        let islands = r#"{
            "min_latitude": 52.0,
            "min_longitude": 13.0,
            "vertices": [
                {"id": 1, "x": 0.0, "y": 0.0, "neighbours": [2]},
                {"id": 2, "x": 150.0, "y": 0.0, "neighbours": [1]},
                {"id": 3, "x": 0.0, "y": 900.0, "neighbours": [4]},
                {"id": 4, "x": 150.0, "y": 900.0, "neighbours": [3]}
            ]
        }"#;
        let config = EmulatorConfig {
            start_vertex: Some(1),
            ..EmulatorConfig::default()
        };
        let mut emu = VehicleEmulator::from_json(islands, &config).unwrap();
        assert_eq!(emu.graph().reachable_from(1), 2);
        for _ in 0..500 {
            emu.update(0.4).unwrap();
            assert!(emu.planner().points().all(|point| point.vertex <= 2));
        }
    }

    #[test]
    fn resume_is_refused_during_tire_failure() {
        let mut emu = emulator();
        assert!(emu.break_tire());
        assert!(!emu.break_tire());
        emu.update(0.4).unwrap();
        assert_eq!(emu.state().tire().countdown(), REPLACE_TIRE_COUNTDOWN - 1);
        assert!(!emu.break_tire());
        assert!(emu.stop());
        assert!(!emu.start());
    }

    #[test]
    fn invalid_madness_keeps_previous_value() {
        let mut emu = emulator();
        let before = emu.profile().madness();
        assert_eq!(emu.set_madness(0.0), Err(CommandError::InvalidMadness(0.0)));
        assert!((emu.profile().madness() - before).abs() < f64::EPSILON);
        emu.set_madness(0.25).unwrap();
        assert!((emu.profile().madness() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn snapshot_without_geofence_reports_nulls() {
        let emu = emulator();
        let map = emu.snapshot().to_flat_map().unwrap();
        assert_eq!(map["in_rectangle"], serde_json::Value::Null);
        assert_eq!(map["rectangle_lat1"], serde_json::Value::Null);
        assert_eq!(map["tirepressrl"], 27);
        assert_eq!(map["tirepressfl"], 27);
        assert_eq!(map["vc_model_year"], 225);
        assert_eq!(map["odo"], 232);
        assert!(map.values().all(|value| !value.is_object()));
    }

    #[test]
    fn test_rectangle_surrounds_the_vehicle() {
        let mut emu = emulator();
        emu.test_rectangle(TEST_RECTANGLE_HALF_SIZE_M).unwrap();
        let telemetry = emu.snapshot();
        assert_eq!(telemetry.in_rectangle, Some(true));
        assert!(telemetry.rectangle_long0.is_some());
        assert!(emu.test_rectangle(0.0).is_err());

        emu.clear_geofence();
        assert_eq!(emu.snapshot().in_rectangle, None);
    }

    #[test]
    fn degenerate_geofence_is_rejected_without_change() {
        let mut emu = emulator();
        let corner = GeoPoint::new(13.0, 52.0);
        assert_eq!(
            emu.set_geofence(corner, corner),
            Err(CommandError::InvalidRectangle)
        );
        assert!(emu.geofence().rectangle().is_none());
    }

    #[test]
    fn identical_seeds_produce_identical_runs() {
        let mut a = emulator();
        let mut b = emulator();
        for _ in 0..300 {
            a.update(0.4).unwrap();
            b.update(0.4).unwrap();
        }
        assert_eq!(a.snapshot(), b.snapshot());
    }
}
