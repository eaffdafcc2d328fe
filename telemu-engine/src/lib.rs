//! Telemetry Emulator Engine
//!
//! Platform-agnostic core of the vehicle telemetry emulator: a point-mass
//! vehicle driving a random walk over a road graph, with geofence-directed
//! routing and synthetic instrument readings. No I/O beyond optional
//! instrument override files.

pub mod config;
pub mod constants;
pub mod driver;
pub mod emulator;
pub mod error;
pub mod geofence;
pub mod geometry;
pub mod graph;
pub mod indicator;
pub mod instruments;
pub mod kinematics;
pub mod lane;
pub mod numbers;
pub mod planner;
pub mod rng;
pub mod router;
pub mod shared;
pub mod signal;
pub mod telemetry;
pub mod tire;

// Re-export commonly used types
pub use config::EmulatorConfig;
pub use driver::DriverProfile;
pub use emulator::VehicleEmulator;
pub use error::{CommandError, ConfigError, EmulatorError, GraphError};
pub use geofence::{GeoRect, Geofence, GeofenceConfig};
pub use geometry::Position;
pub use graph::{GeoPoint, GraphDocument, RoadGraph, Vertex, VertexId};
pub use indicator::TurnSignal;
pub use kinematics::{KinematicEngine, VehicleState};
pub use planner::{LookaheadPlanner, PlanPoint};
pub use router::{RoutePlan, find_route};
pub use shared::SharedEmulator;
pub use signal::{FileOverride, OverrideSource, SmoothedSignal};
pub use telemetry::{CabinStatus, Telemetry};

/// Trait for abstracting road graph loading.
/// Platform-specific implementations should provide this.
pub trait GraphSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the road graph document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or parsed.
    fn load_document(&self) -> Result<GraphDocument, Self::Error>;
}

/// Load, validate and build an emulator from any graph source.
///
/// # Errors
///
/// Returns the source's error, a graph validation error, or a construction
/// error, boxed.
pub fn build_emulator<S>(
    source: &S,
    config: &EmulatorConfig,
) -> Result<VehicleEmulator, Box<dyn std::error::Error + Send + Sync>>
where
    S: GraphSource,
{
    let document = source.load_document()?;
    let graph = RoadGraph::from_document(document)?;
    Ok(VehicleEmulator::new(graph, config)?)
}
