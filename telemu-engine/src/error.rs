//! Error taxonomy for graph loading, configuration and commands.
use thiserror::Error;

use crate::graph::VertexId;

/// Problems found while loading or validating a road graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("road graph document is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("road graph has no vertices")]
    Empty,
    #[error("vertex {0} is defined more than once")]
    DuplicateVertex(VertexId),
    #[error("vertex {vertex} references missing neighbour {neighbour}")]
    DanglingNeighbour {
        vertex: VertexId,
        neighbour: VertexId,
    },
    #[error("vertex {0} has no neighbours")]
    IsolatedVertex(VertexId),
    #[error("vertex {0} not found")]
    NotFound(VertexId),
    #[error("vertex {id} has non-finite coordinates")]
    NonFiniteCoordinate { id: VertexId },
}

/// Emulator configuration rejected by validation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("start vertex {0} is not part of the road graph")]
    UnknownStartVertex(VertexId),
    #[error("initial geofence is invalid: {0}")]
    Geofence(#[from] CommandError),
}

/// Command arguments rejected without touching emulator state.
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("madness must be within (0, 1] (got {0})")]
    InvalidMadness(f64),
    #[error("rectangle corners must be finite and span a non-empty area")]
    InvalidRectangle,
    #[error("time step must be a positive finite number of seconds (got {0})")]
    InvalidTimeStep(f64),
}

/// Failure to construct an emulator.
#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
