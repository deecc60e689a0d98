//! Geometry metrics of closed footprints
//!
//! All functions are pure. A returned value of `0.0` means that the metric is unavailable for the given
//! (degenerate) input, except for [aspect_ratio], which is infinite for footprints without extent in one
//! direction so that they never pass a maximum aspect ratio.

use std::f64::consts::PI;

use cloudshape_core::{geometry::Footprint, nalgebra::Vector2};
use float_ord::FloatOrd;
use serde::{Deserialize, Serialize};

/// Shoelace area of an open ring (the first vertex is not repeated)
pub fn ring_area(ring: &[Vector2<f64>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let twice_area: f64 = ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    0.5 * twice_area.abs()
}

pub fn area(footprint: &Footprint) -> f64 {
    ring_area(footprint.open_ring())
}

pub fn perimeter(footprint: &Footprint) -> f64 {
    footprint.edge_lengths().iter().sum()
}

/// How the aspect ratio of a footprint is estimated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AspectMethod {
    /// Rectangle fit from the sorted edge lengths: the shortest edge is taken as width and the third
    /// shortest as height. This is a crude heuristic that is only accurate for near-rectangular rings
    #[default]
    EdgeRank,
    /// Longer over shorter side of the axis-aligned bounding box
    BoundingBox,
}

pub fn aspect_ratio(footprint: &Footprint, method: AspectMethod) -> f64 {
    let ratio = |a: f64, b: f64| {
        if a > 0.0 && b > 0.0 {
            (a / b).max(b / a)
        } else {
            f64::INFINITY
        }
    };
    match method {
        AspectMethod::EdgeRank => {
            let mut edges = footprint.edge_lengths();
            if edges.len() < 3 {
                return f64::INFINITY;
            }
            edges.sort_by_key(|e| FloatOrd(*e));
            ratio(edges[2], edges[0])
        }
        AspectMethod::BoundingBox => {
            let bounds = footprint.bounds();
            ratio(bounds.width(), bounds.height())
        }
    }
}

/// Isoperimetric quotient `4 * PI * area / perimeter^2`. 1 for a circle, smaller for elongated shapes
pub fn compactness(area: f64, perimeter: f64) -> f64 {
    if perimeter <= 0.0 {
        return 0.0;
    }
    4.0 * PI * area / (perimeter * perimeter)
}

/// Points per square meter of `hull_area`
pub fn point_density(point_count: usize, hull_area: f64) -> f64 {
    if hull_area <= 0.0 {
        return 0.0;
    }
    point_count as f64 / hull_area
}

/// All metrics of one footprint
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeometryMetrics {
    pub area_m2: f64,
    pub perimeter_m: f64,
    pub aspect_ratio: f64,
    pub compactness: f64,
    pub point_density: f64,
}

impl GeometryMetrics {
    /// `hull_area` is the convex hull area of the cluster points the footprint was built from
    pub fn compute(
        footprint: &Footprint,
        point_count: usize,
        hull_area: f64,
        aspect_method: AspectMethod,
    ) -> Self {
        let area_m2 = area(footprint);
        let perimeter_m = perimeter(footprint);
        Self {
            area_m2,
            perimeter_m,
            aspect_ratio: aspect_ratio(footprint, aspect_method),
            compactness: compactness(area_m2, perimeter_m),
            point_density: point_density(point_count, hull_area),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn rectangle(width: f64, height: f64) -> Footprint {
        Footprint::from_ring(vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(width, 0.0),
            Vector2::new(width, height),
            Vector2::new(0.0, height),
        ])
        .unwrap()
    }

    #[test]
    fn test_rectangle_metrics() {
        let footprint = rectangle(10.0, 20.0);
        let metrics = GeometryMetrics::compute(&footprint, 400, 200.0, AspectMethod::EdgeRank);
        assert_approx_eq!(metrics.area_m2, 200.0);
        assert_approx_eq!(metrics.perimeter_m, 60.0);
        assert_approx_eq!(metrics.aspect_ratio, 2.0);
        assert_approx_eq!(metrics.compactness, 4.0 * PI * 200.0 / 3600.0);
        assert_approx_eq!(metrics.point_density, 2.0);
    }

    #[test]
    fn test_area_is_orientation_independent() {
        let ccw = rectangle(3.0, 4.0);
        let mut ring = ccw.open_ring().to_vec();
        ring.reverse();
        let cw = Footprint::from_ring(ring).unwrap();
        assert_approx_eq!(area(&ccw), 12.0);
        assert_approx_eq!(area(&cw), 12.0);
    }

    #[test]
    fn test_bounding_box_aspect() {
        let triangle = Footprint::from_ring(vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(8.0, 0.0),
            Vector2::new(0.0, 2.0),
        ])
        .unwrap();
        assert_approx_eq!(aspect_ratio(&triangle, AspectMethod::BoundingBox), 4.0);
    }

    #[test]
    fn test_edge_rank_needs_three_edges() {
        let sliver = Footprint::from_ring(vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 0.0),
        ])
        .unwrap();
        // a zero length edge has no finite ratio
        assert_eq!(aspect_ratio(&sliver, AspectMethod::EdgeRank), f64::INFINITY);
    }

    #[test]
    fn test_degenerate_inputs_yield_zero() {
        assert_eq!(ring_area(&[Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0)]), 0.0);
        assert_eq!(compactness(10.0, 0.0), 0.0);
        assert_eq!(point_density(10, 0.0), 0.0);
        let line = Footprint::from_ring(vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(5.0, 0.0),
            Vector2::new(10.0, 0.0),
        ])
        .unwrap();
        assert_eq!(area(&line), 0.0);
        assert_eq!(aspect_ratio(&line, AspectMethod::BoundingBox), f64::INFINITY);
    }
}
