use std::f64::consts::PI;

use telemu_engine::constants::{
    MAX_ACCELERATION, MAX_BREAK, MAX_SPEED, MIN_SPEED, NOMINAL_TIRE_PRESSURE,
    REPLACE_TIRE_COUNTDOWN,
};
use telemu_engine::{
    EmulatorConfig, GeoRect, GeofenceConfig, GraphDocument, Position, RoadGraph, RoutePlan,
    Vertex, VertexId, VehicleEmulator, find_route,
};

fn vertex(id: VertexId, x: f64, y: f64, neighbours: &[VertexId]) -> Vertex {
    Vertex {
        id,
        x,
        y,
        neighbours: neighbours.iter().copied().collect(),
    }
}

fn document(vertices: Vec<Vertex>) -> GraphDocument {
    GraphDocument {
        min_latitude: 48.1,
        min_longitude: 11.5,
        vertices,
    }
}

/// Square street grid, `size` x `size` crossings `spacing` meters apart.
fn grid(size: u32, spacing: f64) -> RoadGraph {
    let id = |col: u32, row: u32| row * size + col + 1;
    let mut vertices = Vec::new();
    for row in 0..size {
        for col in 0..size {
            let mut neighbours = Vec::new();
            if col > 0 {
                neighbours.push(id(col - 1, row));
            }
            if col + 1 < size {
                neighbours.push(id(col + 1, row));
            }
            if row > 0 {
                neighbours.push(id(col, row - 1));
            }
            if row + 1 < size {
                neighbours.push(id(col, row + 1));
            }
            vertices.push(vertex(
                id(col, row),
                f64::from(col) * spacing,
                f64::from(row) * spacing,
                &neighbours,
            ));
        }
    }
    RoadGraph::from_document(document(vertices)).unwrap()
}

fn square_loop() -> RoadGraph {
    RoadGraph::from_document(document(vec![
        vertex(1, 0.0, 0.0, &[2, 4]),
        vertex(2, 200.0, 0.0, &[1, 3]),
        vertex(3, 200.0, 200.0, &[2, 4]),
        vertex(4, 0.0, 200.0, &[3, 1]),
    ]))
    .unwrap()
}

#[test]
fn speed_and_acceleration_stay_within_envelope() {
    let config = EmulatorConfig {
        seed: 2024,
        ..EmulatorConfig::default()
    };
    let mut emu = VehicleEmulator::new(grid(5, 120.0), &config).unwrap();
    let steps = [0.05, 0.4, 1.0, 0.1, 2.5, 0.4];
    for tick in 0..4_000 {
        emu.update(steps[tick % steps.len()]).unwrap();
        let state = emu.state();
        assert!((0.0..=MAX_SPEED).contains(&state.speed()), "speed {}", state.speed());
        assert!(
            (-MAX_BREAK..=MAX_ACCELERATION).contains(&state.acceleration()),
            "acceleration {}",
            state.acceleration()
        );
        assert_eq!(emu.planner().len(), config.plan_length);
    }
    assert!(emu.state().vertices_reached() > 10);
}

#[test]
fn turn_angles_stay_in_half_open_range() {
    let config = EmulatorConfig {
        seed: 77,
        plan_length: 16,
        ..EmulatorConfig::default()
    };
    let mut emu = VehicleEmulator::new(grid(4, 80.0), &config).unwrap();
    for _ in 0..2_000 {
        emu.update(0.4).unwrap();
        for point in emu.planner().points() {
            assert!(point.turn_angle > -PI && point.turn_angle <= PI);
        }
    }
}

#[test]
fn router_single_hop_into_rectangle() {
    let graph = RoadGraph::from_document(document(vec![
        vertex(1, 0.0, 0.0, &[2]),
        vertex(2, 100.0, 0.0, &[1]),
    ]))
    .unwrap();
    let rect = GeoRect::new(
        graph.to_geo(Position::new(50.0, -50.0)),
        graph.to_geo(Position::new(150.0, 50.0)),
    )
    .unwrap();
    let inside = |v: &Vertex| rect.contains(graph.to_geo(v.position()));

    assert_eq!(find_route(&graph, None, 1, inside), RoutePlan::from_path(&[1, 2]));
    assert!(find_route(&graph, None, 1, |_| false).is_empty());
}

#[test]
fn tire_failure_completes_in_fixed_ticks() {
    let config = EmulatorConfig {
        seed: 3,
        ..EmulatorConfig::default()
    };
    let mut emu = VehicleEmulator::new(grid(3, 150.0), &config).unwrap();
    for _ in 0..50 {
        emu.update(0.4).unwrap();
    }
    assert!(emu.break_tire());
    let mut stop_seen = false;
    for tick in 1..=REPLACE_TIRE_COUNTDOWN {
        emu.update(0.4).unwrap();
        stop_seen |= emu.state().stop_commanded();
        if tick == 10 {
            assert!(!emu.break_tire());
            assert_eq!(emu.state().tire().countdown(), REPLACE_TIRE_COUNTDOWN - 10);
        }
        if tick < REPLACE_TIRE_COUNTDOWN {
            assert!(emu.state().tire().is_broken());
        }
    }
    assert!(stop_seen);
    let state = emu.state();
    assert!(!state.stop_commanded());
    assert!(!state.tire().is_broken());
    assert!((state.tire().pressure() - NOMINAL_TIRE_PRESSURE).abs() < f64::EPSILON);
    assert_eq!(emu.snapshot().tirepressrl, 27);
    assert!(emu.break_tire());
}

#[test]
fn four_vertex_loop_at_full_madness() {
    let config = EmulatorConfig {
        seed: 500,
        initial_madness: 1.0,
        madness_drift: false,
        ..EmulatorConfig::default()
    };
    let mut emu = VehicleEmulator::new(square_loop(), &config).unwrap();
    let mut odometer = emu.state().odometer_m();
    for _ in 0..500 {
        emu.update(1.0).unwrap();
        let state = emu.state();
        assert!(state.speed() <= MAX_SPEED);
        assert!(state.odometer_m() >= odometer);
        odometer = state.odometer_m();
    }
    assert!((emu.profile().madness() - 1.0).abs() < f64::EPSILON);
    assert!(emu.state().vertices_reached() > 4);
}

#[test]
fn dead_end_shuttle_keeps_reaching_vertices_at_full_madness() {
    for dt in [0.4, 2.0] {
        let graph = RoadGraph::from_document(document(vec![
            vertex(1, 0.0, 0.0, &[2]),
            vertex(2, 200.0, 0.0, &[1]),
        ]))
        .unwrap();
        let config = EmulatorConfig {
            seed: 41,
            initial_madness: 1.0,
            madness_drift: false,
            ..EmulatorConfig::default()
        };
        let mut emu = VehicleEmulator::new(graph, &config).unwrap();
        let odometer = emu.state().odometer_m();
        let mut top_speed: f64 = 0.0;
        for _ in 0..2_000 {
            emu.update(dt).unwrap();
            top_speed = top_speed.max(emu.state().speed());
        }
        let state = emu.state();
        assert!(
            state.vertices_reached() >= 20,
            "dt {dt}: only {} vertices reached",
            state.vertices_reached()
        );
        assert!(top_speed > MIN_SPEED);
        assert!(state.odometer_m() - odometer > 19.0 * 200.0);
    }
}

#[test]
fn geofence_commands_mid_run_steer_in_and_back_out() {
    let config = EmulatorConfig {
        seed: 19,
        plan_length: 3,
        madness_drift: false,
        start_vertex: Some(1),
        ..EmulatorConfig::default()
    };
    let mut emu = VehicleEmulator::new(grid(5, 120.0), &config).unwrap();
    for _ in 0..50 {
        emu.update(0.4).unwrap();
    }
    assert_eq!(emu.snapshot().in_rectangle, None);

    // only the far corner crossing (480, 480) lies inside
    let corner0 = emu.graph().to_geo(Position::new(420.0, 420.0));
    let corner1 = emu.graph().to_geo(Position::new(600.0, 600.0));
    emu.set_geofence(corner0, corner1).unwrap();
    emu.set_geofence_direction(true);

    let advances_until = |emu: &mut VehicleEmulator, wanted: bool| {
        let start = emu.state().vertices_reached();
        for _ in 0..20_000 {
            if emu.snapshot().in_rectangle == Some(wanted) {
                return Some(emu.state().vertices_reached() - start);
            }
            emu.update(0.1).unwrap();
        }
        None
    };

    let inbound = advances_until(&mut emu, true).expect("entered rectangle");
    assert!(inbound <= 16, "took {inbound} vertices to enter");

    emu.set_geofence_direction(false);
    assert!(emu.geofence().route().is_empty());
    let outbound = advances_until(&mut emu, false).expect("left rectangle");
    assert!(outbound <= 16, "took {outbound} vertices to leave");
}

#[test]
fn geofence_steers_into_rectangle_within_three_vertices() {
    // A -> B -> C -> D is the only way in; E and F are decoys off B.
    let graph = RoadGraph::from_document(document(vec![
        vertex(1, 0.0, 0.0, &[2]),
        vertex(2, 100.0, 0.0, &[1, 3, 5, 6]),
        vertex(3, 200.0, 0.0, &[2, 4]),
        vertex(4, 300.0, 0.0, &[3, 7]),
        vertex(5, 100.0, -200.0, &[2]),
        vertex(6, 100.0, 200.0, &[2]),
        vertex(7, 400.0, 0.0, &[4]),
    ]))
    .unwrap();
    let rectangle = GeoRect::new(
        graph.to_geo(Position::new(250.0, -100.0)),
        graph.to_geo(Position::new(1_000.0, 100.0)),
    )
    .unwrap();
    let config = EmulatorConfig {
        seed: 11,
        plan_length: 3,
        madness_drift: false,
        start_vertex: Some(1),
        geofence: Some(GeofenceConfig {
            rectangle,
            into_rectangle: true,
        }),
        ..EmulatorConfig::default()
    };
    let mut emu = VehicleEmulator::new(graph, &config).unwrap();
    assert_eq!(emu.snapshot().in_rectangle, Some(false));

    let mut visited = vec![emu.planner().prev().vertex];
    for _ in 0..20_000 {
        let reached = emu.state().vertices_reached();
        emu.update(0.1).unwrap();
        if emu.state().vertices_reached() > reached {
            visited.push(emu.planner().prev().vertex);
        }
        if emu.state().vertices_reached() >= 3 {
            break;
        }
    }
    assert_eq!(visited, vec![1, 2, 3, 4]);
    assert_eq!(emu.snapshot().in_rectangle, Some(true));
    assert!(emu.snapshot().move_to_rectangle);
}

#[test]
fn stop_brakes_to_standstill_until_resumed() {
    let config = EmulatorConfig {
        seed: 8,
        ..EmulatorConfig::default()
    };
    let mut emu = VehicleEmulator::new(grid(4, 300.0), &config).unwrap();
    for _ in 0..60 {
        emu.update(0.4).unwrap();
    }
    assert!(emu.state().speed() > 0.0);

    assert!(emu.stop());
    let mut last = emu.state().speed();
    let mut stopped_after = None;
    for tick in 0..500 {
        emu.update(0.1).unwrap();
        let speed = emu.state().speed();
        assert!(speed <= last);
        last = speed;
        if speed == 0.0 {
            stopped_after = Some(tick);
            break;
        }
    }
    assert!(stopped_after.is_some());
    for _ in 0..50 {
        emu.update(0.1).unwrap();
        assert_eq!(emu.state().speed(), 0.0);
        assert!(emu.snapshot().hazard_status);
    }

    assert!(emu.start());
    for _ in 0..10 {
        emu.update(0.1).unwrap();
    }
    assert!(emu.state().speed() > 0.0);
}
