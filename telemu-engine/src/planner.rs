//! Rolling lookahead window over a random walk on the road graph.
use rand::Rng;
use rand::seq::SliceRandom;
use smallvec::SmallVec;
use std::collections::VecDeque;

use crate::config::check_plan_length;
use crate::driver::DriverProfile;
use crate::error::ConfigError;
use crate::geofence::Geofence;
use crate::geometry::turn_angle;
use crate::graph::{RoadGraph, VertexId};

/// One upcoming vertex with its precomputed turn geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanPoint {
    pub vertex: VertexId,
    /// Signed turn at this vertex, negative to the left, in `(-pi, pi]`.
    pub turn_angle: f64,
    pub max_turn_speed: f64,
    /// Path distance from the current target vertex to this vertex.
    pub distance: f64,
}

impl PlanPoint {
    const fn seed(vertex: VertexId) -> Self {
        Self {
            vertex,
            turn_angle: 0.0,
            max_turn_speed: 0.0,
            distance: 0.0,
        }
    }
}

/// Fixed-length window: index 0 is the vertex just left, index 1 the current
/// target, index 2 the vertex after it.
#[derive(Debug, Clone)]
pub struct LookaheadPlanner {
    points: VecDeque<PlanPoint>,
}

impl LookaheadPlanner {
    /// Seed the window at `start` (or a random vertex), step to a random
    /// neighbour, then extend to `length` points.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RangeViolation`] for an unsupported `length` and
    /// [`ConfigError::UnknownStartVertex`] when `start` is not in `graph`.
    pub fn new<R: Rng + ?Sized>(
        graph: &RoadGraph,
        length: usize,
        start: Option<VertexId>,
        profile: &DriverProfile,
        geofence: &mut Geofence,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        check_plan_length(length)?;
        let first = match start {
            Some(id) if graph.contains(id) => id,
            Some(id) => return Err(ConfigError::UnknownStartVertex(id)),
            None => graph.vertex_at(rng.gen_range(0..graph.len())).id,
        };
        let second = random_next(graph, first, None, rng);

        let mut planner = Self {
            points: VecDeque::with_capacity(length + 1),
        };
        planner.points.push_back(PlanPoint::seed(first));
        planner.points.push_back(PlanPoint::seed(second));
        while planner.points.len() < length {
            planner.extend(graph, profile, geofence, rng);
        }
        Ok(planner)
    }

    /// Append one point after the tail, following the geofence route when
    /// it has a hop for the tail vertex.
    fn extend<R: Rng + ?Sized>(
        &mut self,
        graph: &RoadGraph,
        profile: &DriverProfile,
        geofence: &mut Geofence,
        rng: &mut R,
    ) {
        let len = self.points.len();
        let prev = self.points[len - 2].vertex;
        let tail = self.points[len - 1];

        let next = geofence
            .next_hop(graph, prev, tail.vertex)
            .unwrap_or_else(|| random_next(graph, tail.vertex, Some(prev), rng));

        let prev_pos = graph.known(prev).position();
        let tail_pos = graph.known(tail.vertex).position();
        let next_pos = graph.known(next).position();

        let angle = turn_angle(prev_pos, tail_pos, next_pos);
        let tail_point = &mut self.points[len - 1];
        tail_point.turn_angle = angle;
        tail_point.max_turn_speed = profile.max_turn_speed(angle);

        self.points.push_back(PlanPoint {
            vertex: next,
            turn_angle: 0.0,
            max_turn_speed: 0.0,
            distance: tail.distance + tail_pos.distance_to(next_pos),
        });
    }

    /// The vehicle reached the current target: drop the front point, rebase
    /// distances onto the new target and refill the tail.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        graph: &RoadGraph,
        profile: &DriverProfile,
        geofence: &mut Geofence,
        rng: &mut R,
    ) {
        self.points
            .pop_front()
            .expect("lookahead window holds at least three points");
        let travelled = graph
            .known(self.points[0].vertex)
            .position()
            .distance_to(graph.known(self.points[1].vertex).position());
        for point in self.points.iter_mut().skip(1) {
            point.distance -= travelled;
        }
        self.extend(graph, profile, geofence, rng);
    }

    /// Recompute turn speed limits after a madness change.
    pub fn rescore(&mut self, profile: &DriverProfile) {
        for point in &mut self.points {
            point.max_turn_speed = profile.max_turn_speed(point.turn_angle);
        }
    }

    #[must_use]
    pub fn prev(&self) -> &PlanPoint {
        &self.points[0]
    }

    #[must_use]
    pub fn current(&self) -> &PlanPoint {
        &self.points[1]
    }

    #[must_use]
    pub fn next(&self) -> &PlanPoint {
        &self.points[2]
    }

    #[must_use]
    pub fn current_turn_angle(&self) -> f64 {
        self.current().turn_angle
    }

    /// Points from the current target onwards.
    pub fn upcoming(&self) -> impl Iterator<Item = &PlanPoint> {
        self.points.iter().skip(1)
    }

    pub fn points(&self) -> impl Iterator<Item = &PlanPoint> {
        self.points.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Random neighbour of `current`, avoiding an immediate U-turn onto `prev`
/// whenever another choice exists.
fn random_next<R: Rng + ?Sized>(
    graph: &RoadGraph,
    current: VertexId,
    prev: Option<VertexId>,
    rng: &mut R,
) -> VertexId {
    let mut choices: SmallVec<[VertexId; 4]> = graph.known(current).neighbours.clone();
    if choices.len() >= 2
        && let Some(prev) = prev
        && let Some(slot) = choices.iter().position(|&id| id == prev)
    {
        choices.remove(slot);
    }
    *choices
        .choose(rng)
        .expect("validated graph has no isolated vertices")
}
