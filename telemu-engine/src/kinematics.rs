//! Point-mass vehicle model advanced once per tick.
use crate::constants::{
    FUEL_CONSUMPTION, GAS_REFILL_M, GAS_RESERVE_M, INITIAL_SPEED, MAX_BREAK, MAX_SPEED,
    MIN_FUEL_CONSUMPTION, MIN_RPM, MIN_SPEED, MPS_TO_KMPH, SPEED_PER_GEAR,
    STEERING_DISTANCE, STOP_SIGNAL_BRAKE_THRESHOLD, TOP_GEAR, TURN_SIGNAL_ANGLE_THRESHOLD,
    TURN_SIGNAL_DISTANCE,
};
use crate::driver::DriverProfile;
use crate::geofence::Geofence;
use crate::geometry::{Position, steering_fraction};
use crate::graph::RoadGraph;
use crate::indicator::{Indicator, TurnSignal};
use crate::lane::{LaneOffset, lane_change_steering};
use crate::numbers::{floor_div_to_i64, trunc_to_i32};
use crate::planner::LookaheadPlanner;
use crate::rng::RngBundle;
use crate::tire::{StopRequest, TireFailure};

/// Upper bound on vertices crossed in one tick; only reachable on graphs
/// with long runs of coincident vertices.
const MAX_CROSSINGS_PER_TICK: usize = 4_096;

/// Continuous and discrete state of the emulated vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    /// Center-line position; the lane offset is applied only for display.
    pub(crate) position: Position,
    pub(crate) heading: f64,
    pub(crate) steering: f64,
    pub(crate) speed: f64,
    pub(crate) acceleration: f64,
    pub(crate) lane: LaneOffset,
    pub(crate) odometer_m: f64,
    pub(crate) gas_range_m: f64,
    pub(crate) distance_to_turn: f64,
    pub(crate) stop_commanded: bool,
    pub(crate) indicator: Indicator,
    pub(crate) tire: TireFailure,
    pub(crate) ticks: u64,
    pub(crate) vertices_reached: u64,
}

impl VehicleState {
    /// Vehicle parked on the window's previous vertex, facing its target.
    #[must_use]
    pub fn at_start(
        graph: &RoadGraph,
        planner: &LookaheadPlanner,
        odometer_m: f64,
        gas_range_m: f64,
    ) -> Self {
        let start = graph.known(planner.prev().vertex).position();
        let target = graph.known(planner.current().vertex).position();
        Self {
            position: start,
            heading: start.heading_to(target),
            steering: 0.0,
            speed: INITIAL_SPEED,
            acceleration: 0.0,
            lane: LaneOffset::default(),
            odometer_m,
            gas_range_m,
            distance_to_turn: start.distance_to(target),
            stop_commanded: false,
            indicator: Indicator::default(),
            tire: TireFailure::default(),
            ticks: 0,
            vertices_reached: 0,
        }
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Position including the lateral lane offset.
    #[must_use]
    pub fn display_position(&self) -> Position {
        self.lane.apply(self.position, self.heading)
    }

    #[must_use]
    pub const fn heading(&self) -> f64 {
        self.heading
    }

    /// Steering angle in radians, negative to the left.
    #[must_use]
    pub const fn steering(&self) -> f64 {
        self.steering
    }

    /// Meters per second.
    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    #[must_use]
    pub const fn acceleration(&self) -> f64 {
        self.acceleration
    }

    #[must_use]
    pub const fn lane(&self) -> LaneOffset {
        self.lane
    }

    #[must_use]
    pub const fn odometer_m(&self) -> f64 {
        self.odometer_m
    }

    #[must_use]
    pub const fn gas_range_m(&self) -> f64 {
        self.gas_range_m
    }

    #[must_use]
    pub const fn distance_to_turn(&self) -> f64 {
        self.distance_to_turn
    }

    #[must_use]
    pub const fn stop_commanded(&self) -> bool {
        self.stop_commanded
    }

    #[must_use]
    pub const fn turn_signal(&self) -> TurnSignal {
        self.indicator.signal()
    }

    #[must_use]
    pub const fn tire(&self) -> &TireFailure {
        &self.tire
    }

    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Vertices physically reached since start.
    #[must_use]
    pub const fn vertices_reached(&self) -> u64 {
        self.vertices_reached
    }

    #[must_use]
    pub fn speed_kmph(&self) -> i32 {
        trunc_to_i32(self.speed * MPS_TO_KMPH)
    }

    /// Gear 0 is neutral, only engaged while stopping on command.
    #[must_use]
    pub fn gear(&self) -> i32 {
        if self.speed < MIN_SPEED && self.stop_commanded {
            return 0;
        }
        let gear = floor_div_to_i64(self.speed, SPEED_PER_GEAR).clamp(0, i64::from(TOP_GEAR - 1));
        i32::try_from(gear).unwrap_or(TOP_GEAR - 1) + 1
    }

    #[must_use]
    pub fn rpm(&self) -> i32 {
        let in_gear = (self.speed % SPEED_PER_GEAR) / SPEED_PER_GEAR;
        match self.gear() {
            0 => MIN_RPM,
            1 => trunc_to_i32(in_gear.mul_add(1_500.0, 1_500.0)),
            _ => trunc_to_i32(in_gear.mul_add(1_000.0, 2_500.0)),
        }
    }

    /// Liters per 100 km.
    #[must_use]
    pub fn fuel_consumption(&self) -> f64 {
        f64::from(self.rpm()) * MIN_FUEL_CONSUMPTION / f64::from(MIN_RPM)
    }

    #[must_use]
    pub fn odometer_km(&self) -> i64 {
        floor_div_to_i64(self.odometer_m, 1_000.0)
    }

    #[must_use]
    pub fn gas_range_km(&self) -> i64 {
        floor_div_to_i64(self.gas_range_m, 1_000.0)
    }

    /// Tank contents in liters implied by the remaining range.
    #[must_use]
    pub fn fuel_level(&self) -> i64 {
        let range_km = (self.gas_range_m / 1_000.0).floor();
        floor_div_to_i64(range_km * FUEL_CONSUMPTION, 100.0)
    }

    #[must_use]
    pub fn brake_light(&self) -> bool {
        self.acceleration <= -STOP_SIGNAL_BRAKE_THRESHOLD
    }
}

/// Per-tick integrator: longitudinal control, movement along the plan and
/// the small state machines riding on it.
#[derive(Debug, Clone)]
pub struct KinematicEngine {
    state: VehicleState,
    profile: DriverProfile,
}

impl KinematicEngine {
    #[must_use]
    pub const fn new(state: VehicleState, profile: DriverProfile) -> Self {
        Self { state, profile }
    }

    #[must_use]
    pub const fn state(&self) -> &VehicleState {
        &self.state
    }

    pub const fn state_mut(&mut self) -> &mut VehicleState {
        &mut self.state
    }

    #[must_use]
    pub const fn profile(&self) -> &DriverProfile {
        &self.profile
    }

    pub const fn profile_mut(&mut self) -> &mut DriverProfile {
        &mut self.profile
    }

    /// Advance the vehicle by `dt` seconds; `dt` must be positive and finite.
    pub fn step(
        &mut self,
        dt: f64,
        graph: &RoadGraph,
        planner: &mut LookaheadPlanner,
        geofence: &mut Geofence,
        rngs: &mut RngBundle,
    ) {
        self.state.ticks += 1;
        self.state.indicator.tick();

        if self.profile.tick_drift(rngs.driver()) {
            planner.rescore(&self.profile);
        }

        match self.state.tire.tick() {
            Some(StopRequest::Engage) => self.state.stop_commanded = true,
            Some(StopRequest::Release) => self.state.stop_commanded = false,
            None => {}
        }

        if self.state.stop_commanded {
            self.state.indicator.enable(TurnSignal::Emergency);
            self.emergency_brake(dt);
        } else {
            if self.state.speed > 0.0 && self.wants_to_brake(dt, planner) {
                self.brake(dt, planner);
            } else {
                self.accelerate(dt);
            }
            self.signal_upcoming_turn(planner);
        }

        if self.state.speed * dt > self.state.distance_to_turn {
            self.cross_vertices(dt, graph, planner, geofence, rngs);
        } else if self.state.distance_to_turn < STEERING_DISTANCE {
            self.state.steering = steering_fraction(self.state.distance_to_turn, STEERING_DISTANCE)
                * planner.current_turn_angle();
            self.travel(self.state.speed * dt);
        } else {
            self.change_lane(dt, rngs);
            self.travel(self.state.speed * dt);
        }

        let target = graph.known(planner.current().vertex).position();
        self.state.distance_to_turn = self.state.position.distance_to(target);
    }

    fn cruise_acceleration(&self, dt: f64) -> f64 {
        ((self.profile.max_speed() - self.state.speed) / dt)
            .clamp(-MAX_BREAK, self.profile.max_acceleration())
    }

    /// True when, at next tick's speed, the driver's braking could no longer
    /// meet some upcoming turn speed.
    fn wants_to_brake(&self, dt: f64, planner: &LookaheadPlanner) -> bool {
        let speed_next = self.state.speed + self.cruise_acceleration(dt);
        let max_break = self.profile.max_break();
        planner.upcoming().any(|point| {
            let remaining = self.state.distance_to_turn + point.distance;
            let time_to_stop = (speed_next - approach_speed(point.max_turn_speed)) / max_break;
            let distance_to_stop =
                speed_next * time_to_stop - max_break * time_to_stop * time_to_stop / 2.0;
            distance_to_stop > remaining
        })
    }

    /// Strongest deceleration needed to hit any upcoming turn speed exactly.
    fn brake_value(&self, planner: &LookaheadPlanner) -> f64 {
        let speed = self.state.speed;
        planner
            .upcoming()
            .map(|point| {
                let remaining = self.state.distance_to_turn + point.distance;
                let excess = (speed - approach_speed(point.max_turn_speed)).max(0.0);
                let needed = if remaining == 0.0 {
                    0.0
                } else {
                    (speed * excess - excess * excess / 2.0) / remaining
                };
                needed.min(MAX_BREAK)
            })
            .fold(0.0, f64::max)
    }

    fn accelerate(&mut self, dt: f64) {
        self.state.acceleration = self.cruise_acceleration(dt);
        self.integrate_speed(dt);
    }

    fn brake(&mut self, dt: f64, planner: &LookaheadPlanner) {
        self.state.acceleration = -self.brake_value(planner);
        self.integrate_speed(dt);
    }

    /// Stop within this tick if the brakes allow it, else brake at maximum.
    fn emergency_brake(&mut self, dt: f64) {
        let needed = self.state.speed / dt;
        if needed <= MAX_BREAK {
            self.state.acceleration = -needed;
            self.state.speed = 0.0;
        } else {
            self.state.acceleration = -MAX_BREAK;
            self.integrate_speed(dt);
        }
    }

    fn integrate_speed(&mut self, dt: f64) {
        let speed = self.state.speed + self.state.acceleration * dt;
        self.state.speed = speed.clamp(0.0, MAX_SPEED);
    }

    fn signal_upcoming_turn(&mut self, planner: &LookaheadPlanner) {
        let angle = planner.current_turn_angle();
        if angle.abs() > TURN_SIGNAL_ANGLE_THRESHOLD
            && self.state.distance_to_turn < TURN_SIGNAL_DISTANCE
        {
            self.state.indicator.enable(side_signal(angle));
        }
    }

    /// Move through every vertex reachable this tick, then cover the rest.
    fn cross_vertices(
        &mut self,
        dt: f64,
        graph: &RoadGraph,
        planner: &mut LookaheadPlanner,
        geofence: &mut Geofence,
        rngs: &mut RngBundle,
    ) {
        let mut remaining = self.state.speed * dt;
        let mut crossings = 0;
        while remaining > self.state.distance_to_turn {
            if crossings == MAX_CROSSINGS_PER_TICK {
                log::warn!("stopped crossing vertices after {crossings} in one tick");
                break;
            }
            crossings += 1;

            self.travel(self.state.distance_to_turn);
            remaining -= self.state.distance_to_turn;

            let reached = graph.known(planner.current().vertex).position();
            let following = graph.known(planner.next().vertex).position();
            self.state.position = reached;
            self.state.steering = planner.current_turn_angle();
            self.state.heading = reached.heading_to(following);

            planner.advance(graph, &self.profile, geofence, rngs.route());
            self.state.vertices_reached += 1;

            let target = graph.known(planner.current().vertex).position();
            self.state.distance_to_turn = self.state.position.distance_to(target);
        }
        self.travel(remaining);
    }

    fn change_lane(&mut self, dt: f64, rngs: &mut RngBundle) {
        let decision =
            self.state
                .lane
                .decide(self.state.speed, self.state.stop_commanded, rngs.driver());
        match decision {
            Some(direction) => {
                self.state.steering = lane_change_steering(direction, self.state.speed * dt);
                self.state.lane.shift(direction);
                self.state.indicator.enable(side_signal(f64::from(direction)));
            }
            None => self.state.steering = 0.0,
        }
    }

    /// Straight-line movement along the heading; keeps odometer and fuel
    /// range in step.
    fn travel(&mut self, distance: f64) {
        self.state.odometer_m += distance;
        self.state.gas_range_m -= distance;
        if self.state.gas_range_m <= GAS_RESERVE_M {
            self.state.gas_range_m += GAS_REFILL_M;
            log::debug!("refuelled, range now {:.0} m", self.state.gas_range_m);
        }
        self.state.position = self.state.position.advanced(self.state.heading, distance);
    }
}

fn side_signal(direction: f64) -> TurnSignal {
    if direction < 0.0 {
        TurnSignal::Left
    } else {
        TurnSignal::Right
    }
}

/// Target speed at a vertex. Floored at `MIN_SPEED` so a full reversal
/// never plans a standstill short of the vertex.
fn approach_speed(max_turn_speed: f64) -> f64 {
    max_turn_speed.max(MIN_SPEED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_GAS_RANGE_M, DEFAULT_ODOMETER_M, MAX_ACCELERATION};
    use crate::graph::{GraphDocument, Vertex, VertexId};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    /// Two parallel 1 km streets joined at both ends.
    fn long_loop() -> RoadGraph {
        let vertex = |id: VertexId, x: f64, y: f64, neighbours: &[VertexId]| Vertex {
            id,
            x,
            y,
            neighbours: neighbours.iter().copied().collect(),
        };
        RoadGraph::from_document(GraphDocument {
            min_latitude: 45.0,
            min_longitude: 7.0,
            vertices: vec![
                vertex(1, 0.0, 0.0, &[2, 4]),
                vertex(2, 1_000.0, 0.0, &[1, 3]),
                vertex(3, 1_000.0, 60.0, &[2, 4]),
                vertex(4, 0.0, 60.0, &[3, 1]),
            ],
        })
        .unwrap()
    }

    struct Rig {
        graph: RoadGraph,
        planner: LookaheadPlanner,
        fence: Geofence,
        rngs: RngBundle,
        engine: KinematicEngine,
    }

    impl Rig {
        fn new(madness: f64) -> Self {
            let graph = long_loop();
            let profile = DriverProfile::new(madness, false).unwrap();
            let mut fence = Geofence::default();
            let mut rng = SmallRng::seed_from_u64(1);
            let planner =
                LookaheadPlanner::new(&graph, 5, Some(1), &profile, &mut fence, &mut rng).unwrap();
            let state =
                VehicleState::at_start(&graph, &planner, DEFAULT_ODOMETER_M, DEFAULT_GAS_RANGE_M);
            Self {
                graph,
                planner,
                fence,
                rngs: RngBundle::from_user_seed(5),
                engine: KinematicEngine::new(state, profile),
            }
        }

        fn step(&mut self, dt: f64) {
            self.engine.step(
                dt,
                &self.graph,
                &mut self.planner,
                &mut self.fence,
                &mut self.rngs,
            );
        }
    }

    #[test]
    fn accelerates_from_rest_at_driver_limit() {
        let mut rig = Rig::new(1.0);
        rig.step(1.0);
        let state = rig.engine.state();
        assert!((state.acceleration() - MAX_ACCELERATION).abs() < 1e-9);
        assert!((state.speed() - MAX_ACCELERATION).abs() < 1e-9);
        assert_eq!(state.ticks(), 1);
    }

    #[test]
    fn stop_command_brakes_to_zero_with_hazards() {
        let mut rig = Rig::new(1.0);
        for _ in 0..20 {
            rig.step(1.0);
        }
        rig.engine.state_mut().stop_commanded = true;
        let mut last = rig.engine.state().speed();
        for _ in 0..100 {
            rig.step(0.1);
            let speed = rig.engine.state().speed();
            assert!(speed <= last);
            last = speed;
        }
        let state = rig.engine.state();
        assert_eq!(state.speed(), 0.0);
        assert_eq!(state.turn_signal(), TurnSignal::Emergency);
        assert_eq!(state.gear(), 0);
        assert_eq!(state.rpm(), MIN_RPM);
    }

    #[test]
    fn crossing_vertices_advances_the_window() {
        let mut rig = Rig::new(1.0);
        let odometer = rig.engine.state().odometer_m();
        for _ in 0..200 {
            rig.step(1.0);
            assert_eq!(rig.planner.len(), 5);
        }
        let state = rig.engine.state();
        assert!(state.vertices_reached() >= 2);
        assert_ne!(rig.planner.prev().vertex, 1);
        assert!(state.odometer_m() > odometer);
    }

    #[test]
    fn slows_down_before_the_corner() {
        let mut rig = Rig::new(1.0);
        let corner_speed = rig.planner.current().max_turn_speed;
        let mut arrived_at = None;
        for tick in 0..200 {
            let before = rig.engine.state().vertices_reached();
            let speed_before = rig.engine.state().speed();
            rig.step(0.5);
            if rig.engine.state().vertices_reached() > before {
                arrived_at = Some((tick, speed_before));
                break;
            }
        }
        let (_, speed) = arrived_at.expect("corner reached");
        assert!(speed <= corner_speed + MAX_ACCELERATION, "took corner at {speed}");
        assert!(speed < MAX_SPEED);
    }

    #[test]
    fn derived_gauges_follow_speed() {
        let mut rig = Rig::new(1.0);
        let state = rig.engine.state_mut();
        state.speed = 0.0;
        assert_eq!(state.gear(), 1);
        assert_eq!(state.rpm(), 1_500);
        state.speed = 6.0;
        assert_eq!(state.gear(), 2);
        state.speed = 24.0;
        assert_eq!(state.gear(), 5);
        assert!((2_500..3_500).contains(&state.rpm()));
        assert!((state.fuel_consumption() - f64::from(state.rpm()) * 4.0 / 800.0).abs() < 1e-12);
    }

    #[test]
    fn fuel_range_refills_at_reserve() {
        let mut rig = Rig::new(1.0);
        let state = rig.engine.state_mut();
        state.gas_range_m = GAS_RESERVE_M + 10.0;
        rig.engine.travel(20.0);
        let state = rig.engine.state();
        assert!((state.gas_range_m() - (GAS_RESERVE_M - 10.0 + GAS_REFILL_M)).abs() < 1e-6);
        assert_eq!(state.fuel_level(), state.gas_range_km() * 17 / 100);
    }
}
