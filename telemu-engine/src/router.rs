//! Breadth-first route discovery towards vertices matching a predicate.
use std::collections::{HashMap, VecDeque};

use crate::graph::{RoadGraph, Vertex, VertexId};

/// Hop table of a discovered path: each vertex maps to its successor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePlan {
    hops: HashMap<VertexId, VertexId>,
}

impl RoutePlan {
    /// Build a plan from an ordered list of vertices.
    #[must_use]
    pub fn from_path(path: &[VertexId]) -> Self {
        let hops = path
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .collect();
        Self { hops }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    /// Remove and return the hop leaving `from`. Once the successor has no
    /// onward hop the destination is reached and the plan is discarded.
    pub fn take_hop(&mut self, from: VertexId) -> Option<VertexId> {
        let next = self.hops.remove(&from)?;
        if !self.hops.contains_key(&next) {
            self.hops.clear();
        }
        Some(next)
    }

    pub fn clear(&mut self) {
        self.hops.clear();
    }
}

/// Shortest-hop path from `start` to the first vertex satisfying `is_target`.
///
/// `came_from` is treated as already visited so the route never begins by
/// reversing. The returned plan is empty when `start` itself is a target or
/// when no target is reachable.
pub fn find_route<F>(
    graph: &RoadGraph,
    came_from: Option<VertexId>,
    start: VertexId,
    is_target: F,
) -> RoutePlan
where
    F: Fn(&Vertex) -> bool,
{
    let Ok(start_vertex) = graph.vertex(start) else {
        return RoutePlan::default();
    };
    if is_target(start_vertex) {
        return RoutePlan::default();
    }

    let mut parents: HashMap<VertexId, Option<VertexId>> = HashMap::new();
    if let Some(origin) = came_from {
        parents.insert(origin, None);
    }
    parents.insert(start, None);

    let mut frontier = VecDeque::from([start]);
    while let Some(id) = frontier.pop_front() {
        for &neighbour in &graph.known(id).neighbours {
            if parents.contains_key(&neighbour) {
                continue;
            }
            parents.insert(neighbour, Some(id));
            if is_target(graph.known(neighbour)) {
                return RoutePlan::from_path(&walk_back(&parents, neighbour));
            }
            frontier.push_back(neighbour);
        }
    }

    RoutePlan::default()
}

fn walk_back(parents: &HashMap<VertexId, Option<VertexId>>, target: VertexId) -> Vec<VertexId> {
    let mut path = vec![target];
    let mut cursor = target;
    while let Some(&Some(parent)) = parents.get(&cursor) {
        path.push(parent);
        cursor = parent;
    }
    path.reverse();
    path
}
