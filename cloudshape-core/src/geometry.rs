use itertools::Itertools;
use nalgebra::Vector2;

use crate::error::{PipelineError, Result};
use crate::math::Rect;

/// Closed polygon ring in the XY plane
///
/// The first vertex is always repeated as the last vertex and a ring has at least four vertices
/// (three distinct corners). The ring is not checked for self-intersections.
/// ```
/// # use cloudshape_core::geometry::Footprint;
/// # use cloudshape_core::nalgebra::Vector2;
/// let footprint = Footprint::from_ring(vec![
///     Vector2::new(0.0, 0.0),
///     Vector2::new(2.0, 0.0),
///     Vector2::new(2.0, 1.0),
/// ]).unwrap();
/// assert_eq!(footprint.vertices().len(), 4);
/// assert_eq!(footprint.vertices().first(), footprint.vertices().last());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    vertices: Vec<Vector2<f64>>,
    bounds: Rect,
}

impl Footprint {
    /// Creates a footprint from an open or already closed ring. The ring is closed if necessary
    pub fn from_ring(mut ring: Vec<Vector2<f64>>) -> Result<Self> {
        if ring.iter().any(|v| !v.x.is_finite() || !v.y.is_finite()) {
            return Err(PipelineError::Geometry(
                "ring contains non-finite coordinates".into(),
            ));
        }
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last || ring.len() == 1 {
                ring.push(first);
            }
        }
        if ring.len() < 4 {
            return Err(PipelineError::Geometry(format!(
                "a closed ring needs at least 4 vertices, got {}",
                ring.len()
            )));
        }
        let bounds = Rect::from_points(&ring)
            .ok_or_else(|| PipelineError::Geometry("empty ring".into()))?;
        Ok(Self {
            vertices: ring,
            bounds,
        })
    }

    /// All vertices including the closing vertex
    pub fn vertices(&self) -> &[Vector2<f64>] {
        &self.vertices
    }

    /// The vertices without the closing vertex
    pub fn open_ring(&self) -> &[Vector2<f64>] {
        &self.vertices[..self.vertices.len() - 1]
    }

    pub fn into_vertices(self) -> Vec<Vector2<f64>> {
        self.vertices
    }

    /// Lengths of all ring edges, in ring order
    pub fn edge_lengths(&self) -> Vec<f64> {
        self.vertices
            .iter()
            .tuple_windows()
            .map(|(a, b)| (b - a).norm())
            .collect()
    }

    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    pub fn bbox_center(&self) -> Vector2<f64> {
        self.bounds.center()
    }

    /// Mean of the distinct ring vertices
    pub fn vertex_centroid(&self) -> Vector2<f64> {
        let ring = self.open_ring();
        ring.iter().fold(Vector2::zeros(), |acc, v| acc + v) / ring.len() as f64
    }
}
