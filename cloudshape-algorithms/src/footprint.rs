use cloudshape_core::{
    containers::GridIndex,
    error::{PipelineError, Result},
    geometry::Footprint,
    math::Rect,
    nalgebra::Vector2,
};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{convexhull::convex_hull_2d, simplify::simplify_ring};

/// One way of turning the XY points of a cluster into a closed footprint
pub trait FootprintStrategy: Send + Sync {
    /// Tag that is written to the output as the extraction method
    fn name(&self) -> &'static str;
    /// Returns `None` if this strategy cannot produce a valid footprint for `points`
    fn build(&self, points: &[Vector2<f64>]) -> Option<Footprint>;
}

/// Parameters of the concave hull approximation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConcaveHullConfig {
    /// Neighbourhood radius used to detect boundary points
    pub alpha_m: f64,
    /// A point is a boundary point if at most this many points (itself included) lie within `alpha_m`
    pub max_boundary_neighbours: usize,
    pub min_boundary_points: usize,
    /// Douglas-Peucker tolerance applied to the boundary hull
    pub simplify_tolerance_m: f64,
    /// The simplified ring must have at least this many vertices, closing vertex included
    pub min_ring_vertices: usize,
}

impl Default for ConcaveHullConfig {
    fn default() -> Self {
        Self {
            alpha_m: 4.0,
            max_boundary_neighbours: 10,
            min_boundary_points: 4,
            simplify_tolerance_m: 0.5,
            min_ring_vertices: 4,
        }
    }
}

/// Approximate concave hull: the convex hull of all sparse (boundary) points of the cluster, simplified
/// with Douglas-Peucker
#[derive(Debug, Clone, Copy)]
pub struct ConcaveHull {
    config: ConcaveHullConfig,
}

impl ConcaveHull {
    pub fn new(config: ConcaveHullConfig) -> Self {
        Self { config }
    }

    /// Points that have few neighbours within `alpha_m`
    pub fn boundary_points(&self, points: &[Vector2<f64>]) -> Vec<Vector2<f64>> {
        if !(self.config.alpha_m > 0.0) {
            return vec![];
        }
        let index = GridIndex::new(points.iter().map(|p| [p.x, p.y]).collect(), self.config.alpha_m);
        points
            .iter()
            .filter(|p| {
                index.count_within_radius(&[p.x, p.y], self.config.alpha_m)
                    <= self.config.max_boundary_neighbours
            })
            .copied()
            .collect()
    }
}

impl FootprintStrategy for ConcaveHull {
    fn name(&self) -> &'static str {
        "concave_hull"
    }

    fn build(&self, points: &[Vector2<f64>]) -> Option<Footprint> {
        let boundary = self.boundary_points(points);
        if boundary.len() < self.config.min_boundary_points {
            debug!(
                "Concave hull: only {} boundary points, {} required",
                boundary.len(),
                self.config.min_boundary_points
            );
            return None;
        }
        let hull = convex_hull_2d(&boundary);
        if hull.len() < 3 {
            return None;
        }
        let simplified = simplify_ring(&hull, self.config.simplify_tolerance_m);
        if simplified.len() < self.config.min_ring_vertices {
            return None;
        }
        Footprint::from_ring(simplified).ok()
    }
}

/// Convex hull of all cluster points
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvexHull;

impl FootprintStrategy for ConvexHull {
    fn name(&self) -> &'static str {
        "convex_hull"
    }

    fn build(&self, points: &[Vector2<f64>]) -> Option<Footprint> {
        let hull = convex_hull_2d(points);
        if hull.len() < 3 {
            return None;
        }
        Footprint::from_ring(hull).ok()
    }
}

/// Axis-aligned bounding box of the cluster points
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundingBox;

impl FootprintStrategy for BoundingBox {
    fn name(&self) -> &'static str {
        "bounding_box"
    }

    fn build(&self, points: &[Vector2<f64>]) -> Option<Footprint> {
        let rect = Rect::from_points(points)?;
        let mut ring = rect.corners().to_vec();
        ring.push(ring[0]);
        Footprint::from_ring(ring).ok()
    }
}

/// A footprint together with the name of the strategy that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltFootprint {
    pub footprint: Footprint,
    pub method: &'static str,
}

/// Ordered chain of footprint strategies. The first strategy that succeeds wins
pub struct FootprintBuilder {
    strategies: Vec<Box<dyn FootprintStrategy>>,
}

impl FootprintBuilder {
    pub fn new(strategies: Vec<Box<dyn FootprintStrategy>>) -> Self {
        Self { strategies }
    }

    /// Concave hull, then convex hull, then bounding box
    pub fn with_fallbacks(concave: ConcaveHullConfig) -> Self {
        Self::new(vec![
            Box::new(ConcaveHull::new(concave)),
            Box::new(ConvexHull),
            Box::new(BoundingBox),
        ])
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Builds a footprint for the given cluster points. Fails with a geometry error if the cluster has
    /// fewer than four points or if no strategy succeeds
    pub fn build(&self, points: &[Vector2<f64>]) -> Result<BuiltFootprint> {
        if points.len() < 4 {
            return Err(PipelineError::Geometry(format!(
                "a footprint needs at least 4 points, got {}",
                points.len()
            )));
        }
        for strategy in &self.strategies {
            if let Some(footprint) = strategy.build(points) {
                return Ok(BuiltFootprint {
                    footprint,
                    method: strategy.name(),
                });
            }
            debug!("Footprint strategy {} failed, trying next", strategy.name());
        }
        Err(PipelineError::Geometry(
            "no footprint strategy succeeded".into(),
        ))
    }
}
