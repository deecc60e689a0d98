use cloudshape_core::nalgebra::Vector2;

use crate::metrics::ring_area;

fn cross(o: &Vector2<f64>, a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Computes the convex hull of a set of 2D points using Andrew's monotone chain.
/// Returns the hull vertices in counter-clockwise order, starting at the lowest-leftmost point and without
/// repeating the first vertex. Collinear points on the hull boundary and duplicate points are dropped, so
/// degenerate inputs (fewer than three non-collinear points) yield fewer than three vertices.
///
/// # Examples
/// ```
/// # use cloudshape_algorithms::convexhull::convex_hull_2d;
/// # use cloudshape_core::nalgebra::Vector2;
/// let points = vec![
///     Vector2::new(0.0, 0.0),
///     Vector2::new(2.0, 0.0),
///     Vector2::new(1.0, 1.0),
///     Vector2::new(2.0, 2.0),
///     Vector2::new(0.0, 2.0),
/// ];
/// let hull = convex_hull_2d(&points);
/// assert_eq!(hull.len(), 4);
/// assert!(!hull.contains(&Vector2::new(1.0, 1.0)));
/// ```
pub fn convex_hull_2d(points: &[Vector2<f64>]) -> Vec<Vector2<f64>> {
    let mut sorted: Vec<Vector2<f64>> = points
        .iter()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .copied()
        .collect();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<Vector2<f64>> = Vec::with_capacity(2 * sorted.len());
    // lower hull
    for p in &sorted {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }
    // upper hull
    let lower_len = hull.len() + 1;
    for p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(*p);
    }
    // the last point equals the first one
    hull.pop();
    hull
}

/// Area of the convex hull of `points`, 0 for degenerate inputs
pub fn convex_hull_area(points: &[Vector2<f64>]) -> f64 {
    let hull = convex_hull_2d(points);
    if hull.len() < 3 {
        return 0.0;
    }
    ring_area(&hull)
}
