//! Immutable road graph and the plane/geographic projection.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

use crate::constants::DEGREES_PER_METER;
use crate::error::GraphError;
use crate::geometry::Position;

pub type VertexId = u32;

/// Neighbour list kept inline for ordinary street crossings.
pub type Neighbours = SmallVec<[VertexId; 4]>;

/// Road crossing with projected coordinates in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "neighbours", alias = "neighbors", default)]
    pub neighbours: Neighbours,
}

impl Vertex {
    #[must_use]
    pub const fn position(&self) -> Position {
        Position {
            x: self.x,
            y: self.y,
        }
    }
}

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// On-disk shape of a road graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub vertices: Vec<Vertex>,
}

/// Validated, read-only road network.
#[derive(Debug, Clone)]
pub struct RoadGraph {
    min_latitude: f64,
    min_longitude: f64,
    vertices: Vec<Vertex>,
    index: HashMap<VertexId, usize>,
}

impl RoadGraph {
    /// Parse and validate a JSON graph document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the graph is inconsistent.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let document: GraphDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Validate a parsed document and build the lookup index.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty vertex set, duplicate ids, non-finite
    /// coordinates, dangling neighbour references or isolated vertices.
    pub fn from_document(document: GraphDocument) -> Result<Self, GraphError> {
        if document.vertices.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut index = HashMap::with_capacity(document.vertices.len());
        for (slot, vertex) in document.vertices.iter().enumerate() {
            if !vertex.x.is_finite() || !vertex.y.is_finite() {
                return Err(GraphError::NonFiniteCoordinate { id: vertex.id });
            }
            if index.insert(vertex.id, slot).is_some() {
                return Err(GraphError::DuplicateVertex(vertex.id));
            }
        }

        for vertex in &document.vertices {
            if vertex.neighbours.is_empty() {
                return Err(GraphError::IsolatedVertex(vertex.id));
            }
            if let Some(&neighbour) = vertex
                .neighbours
                .iter()
                .find(|neighbour| !index.contains_key(neighbour))
            {
                return Err(GraphError::DanglingNeighbour {
                    vertex: vertex.id,
                    neighbour,
                });
            }
        }

        Ok(Self {
            min_latitude: document.min_latitude,
            min_longitude: document.min_longitude,
            vertices: document.vertices,
            index,
        })
    }

    /// Look up a vertex by id.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] when the id is unknown.
    pub fn vertex(&self, id: VertexId) -> Result<&Vertex, GraphError> {
        self.index
            .get(&id)
            .map(|&slot| &self.vertices[slot])
            .ok_or(GraphError::NotFound(id))
    }

    /// Lookup for ids that already passed through the graph (plan points,
    /// route hops, neighbour lists).
    pub(crate) fn known(&self, id: VertexId) -> &Vertex {
        let slot = self.index[&id];
        &self.vertices[slot]
    }

    #[must_use]
    pub fn contains(&self, id: VertexId) -> bool {
        self.index.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    pub(crate) fn vertex_at(&self, slot: usize) -> &Vertex {
        &self.vertices[slot]
    }

    /// Number of vertices reachable from `start`, including `start`.
    #[must_use]
    pub fn reachable_from(&self, start: VertexId) -> usize {
        if !self.contains(start) {
            return 0;
        }
        let mut seen = HashSet::from([start]);
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            for &next in &self.known(id).neighbours {
                if seen.insert(next) {
                    stack.push(next);
                }
            }
        }
        seen.len()
    }

    #[must_use]
    pub const fn min_latitude(&self) -> f64 {
        self.min_latitude
    }

    #[must_use]
    pub const fn min_longitude(&self) -> f64 {
        self.min_longitude
    }

    #[must_use]
    pub fn x_to_lon(&self, x: f64) -> f64 {
        x * DEGREES_PER_METER + self.min_longitude
    }

    #[must_use]
    pub fn y_to_lat(&self, y: f64) -> f64 {
        y * DEGREES_PER_METER + self.min_latitude
    }

    #[must_use]
    pub fn lon_to_x(&self, lon: f64) -> f64 {
        (lon - self.min_longitude) / DEGREES_PER_METER
    }

    #[must_use]
    pub fn lat_to_y(&self, lat: f64) -> f64 {
        (lat - self.min_latitude) / DEGREES_PER_METER
    }

    #[must_use]
    pub fn to_geo(&self, position: Position) -> GeoPoint {
        GeoPoint::new(self.x_to_lon(position.x), self.y_to_lat(position.y))
    }

    #[must_use]
    pub fn to_plane(&self, point: GeoPoint) -> Position {
        Position::new(self.lon_to_x(point.longitude), self.lat_to_y(point.latitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_json() -> &'static str {
        r#"{
            "min_latitude": 40.0,
            "min_longitude": -75.0,
            "vertices": [
                {"id": 1, "x": 0.0, "y": 0.0, "neighbours": [2, 4]},
                {"id": 2, "x": 100.0, "y": 0.0, "neighbours": [1, 3]},
                {"id": 3, "x": 100.0, "y": 100.0, "neighbours": [2, 4]},
                {"id": 4, "x": 0.0, "y": 100.0, "neighbours": [3, 1]}
            ]
        }"#
    }

    #[test]
    fn loads_and_indexes_vertices() {
        let graph = RoadGraph::from_json(square_json()).unwrap();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.vertex(3).unwrap().position(), Position::new(100.0, 100.0));
        assert!(matches!(graph.vertex(9), Err(GraphError::NotFound(9))));
        assert_eq!(graph.reachable_from(1), 4);
    }

    #[test]
    fn projection_roundtrips_through_geographic_coordinates() {
        let graph = RoadGraph::from_json(square_json()).unwrap();
        let position = Position::new(123.5, 456.25);
        let back = graph.to_plane(graph.to_geo(position));
        assert!((back.x - position.x).abs() < 1e-6);
        assert!((back.y - position.y).abs() < 1e-6);
        assert!((graph.y_to_lat(0.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_dangling_neighbours() {
        let json = r#"{"min_latitude": 0, "min_longitude": 0, "vertices": [
            {"id": 1, "x": 0, "y": 0, "neighbours": [2]}
        ]}"#;
        assert!(matches!(
            RoadGraph::from_json(json),
            Err(GraphError::DanglingNeighbour {
                vertex: 1,
                neighbour: 2
            })
        ));
    }

    #[test]
    fn rejects_empty_duplicate_and_isolated_graphs() {
        let empty = r#"{"min_latitude": 0, "min_longitude": 0, "vertices": []}"#;
        assert!(matches!(RoadGraph::from_json(empty), Err(GraphError::Empty)));

        let duplicate = r#"{"min_latitude": 0, "min_longitude": 0, "vertices": [
            {"id": 1, "x": 0, "y": 0, "neighbours": [1]},
            {"id": 1, "x": 5, "y": 0, "neighbours": [1]}
        ]}"#;
        assert!(matches!(
            RoadGraph::from_json(duplicate),
            Err(GraphError::DuplicateVertex(1))
        ));

        let isolated = r#"{"min_latitude": 0, "min_longitude": 0, "vertices": [
            {"id": 1, "x": 0, "y": 0, "neighbours": []}
        ]}"#;
        assert!(matches!(
            RoadGraph::from_json(isolated),
            Err(GraphError::IsolatedVertex(1))
        ));
    }

    #[test]
    fn accepts_american_spelling_of_neighbours() {
        let json = r#"{"min_latitude": 0, "min_longitude": 0, "vertices": [
            {"id": 1, "x": 0, "y": 0, "neighbors": [2]},
            {"id": 2, "x": 1, "y": 0, "neighbors": [1]}
        ]}"#;
        let graph = RoadGraph::from_json(json).unwrap();
        assert_eq!(graph.vertex(1).unwrap().neighbours.as_slice(), &[2]);
    }
}
