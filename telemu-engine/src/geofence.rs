//! Rectangle geofence and the route steering state attached to it.
use serde::{Deserialize, Serialize};

use crate::error::CommandError;
use crate::graph::{GeoPoint, RoadGraph, VertexId};
use crate::router::{RoutePlan, find_route};

/// Axis-aligned rectangle given by two opposite geographic corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoRect {
    pub corner0: GeoPoint,
    pub corner1: GeoPoint,
}

impl GeoRect {
    /// Validate corners; they may be given in any order.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidRectangle`] for non-finite corners or a
    /// rectangle without area.
    pub fn new(corner0: GeoPoint, corner1: GeoPoint) -> Result<Self, CommandError> {
        let finite = [
            corner0.longitude,
            corner0.latitude,
            corner1.longitude,
            corner1.latitude,
        ]
        .iter()
        .all(|value| value.is_finite());
        if !finite
            || corner0.longitude == corner1.longitude
            || corner0.latitude == corner1.latitude
        {
            return Err(CommandError::InvalidRectangle);
        }
        Ok(Self { corner0, corner1 })
    }

    /// Strict containment: points on the border are outside.
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        let (lon_lo, lon_hi) = ordered(self.corner0.longitude, self.corner1.longitude);
        let (lat_lo, lat_hi) = ordered(self.corner0.latitude, self.corner1.latitude);
        point.longitude > lon_lo
            && point.longitude < lon_hi
            && point.latitude > lat_lo
            && point.latitude < lat_hi
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Initial geofence supplied through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceConfig {
    pub rectangle: GeoRect,
    #[serde(default)]
    pub into_rectangle: bool,
}

/// Target rectangle, desired side, and the cached route towards it.
#[derive(Debug, Clone, Default)]
pub struct Geofence {
    rectangle: Option<GeoRect>,
    into_rectangle: bool,
    route: RoutePlan,
}

impl Geofence {
    #[must_use]
    pub fn from_config(config: Option<GeofenceConfig>) -> Self {
        config.map_or_else(Self::default, |cfg| Self {
            rectangle: Some(cfg.rectangle),
            into_rectangle: cfg.into_rectangle,
            route: RoutePlan::default(),
        })
    }

    #[must_use]
    pub const fn rectangle(&self) -> Option<GeoRect> {
        self.rectangle
    }

    #[must_use]
    pub const fn into_rectangle(&self) -> bool {
        self.into_rectangle
    }

    #[must_use]
    pub const fn route(&self) -> &RoutePlan {
        &self.route
    }

    /// Replace the rectangle; the cached route is dropped only on change.
    pub fn set_rectangle(&mut self, rectangle: GeoRect) {
        if self.rectangle != Some(rectangle) {
            self.rectangle = Some(rectangle);
            self.route.clear();
        }
    }

    pub fn clear(&mut self) {
        self.rectangle = None;
        self.route.clear();
    }

    /// Choose whether the vehicle should end up inside (`true`) or outside.
    pub fn set_direction(&mut self, into_rectangle: bool) {
        if self.into_rectangle != into_rectangle {
            self.into_rectangle = into_rectangle;
            self.route.clear();
        }
    }

    /// `None` without a rectangle.
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> Option<bool> {
        self.rectangle.map(|rect| rect.contains(point))
    }

    fn vertex_inside(&self, graph: &RoadGraph, id: VertexId) -> bool {
        let vertex = graph.known(id);
        self.contains(graph.to_geo(vertex.position()))
            .unwrap_or(false)
    }

    /// True when steering is active and `id` lies on the undesired side.
    #[must_use]
    pub fn is_wrong_side(&self, graph: &RoadGraph, id: VertexId) -> bool {
        self.rectangle.is_some() && self.vertex_inside(graph, id) != self.into_rectangle
    }

    /// Routed successor for `current`, discovering a route when none is cached.
    ///
    /// Returns `None` when steering is inactive, `current` is already on the
    /// right side, or no route exists; callers then fall back to a random walk.
    pub fn next_hop(
        &mut self,
        graph: &RoadGraph,
        previous: VertexId,
        current: VertexId,
    ) -> Option<VertexId> {
        if !self.is_wrong_side(graph, current) {
            return None;
        }
        if self.route.is_empty() {
            let rectangle = self.rectangle?;
            let into = self.into_rectangle;
            self.route = find_route(graph, Some(previous), current, |vertex| {
                rectangle.contains(graph.to_geo(vertex.position())) == into
            });
            if self.route.is_empty() {
                log::debug!("no geofence route reachable from vertex {current}");
            } else {
                log::debug!(
                    "geofence route from vertex {current} discovered with {} hops",
                    self.route.len()
                );
            }
        }
        let hop = self.route.take_hop(current);
        if hop.is_some() && self.route.is_empty() {
            log::debug!("geofence route exhausted at vertex {current}");
        }
        hop
    }
}
