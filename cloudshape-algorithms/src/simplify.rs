use cloudshape_core::nalgebra::Vector2;

/// Distance of `point` to the infinite line through `start` and `end`, or to `start` if both coincide
fn distance_to_line(point: &Vector2<f64>, start: &Vector2<f64>, end: &Vector2<f64>) -> f64 {
    let direction = end - start;
    let length = direction.norm();
    if length == 0.0 {
        return (point - start).norm();
    }
    (direction.x * (start.y - point.y) - direction.y * (start.x - point.x)).abs() / length
}

fn simplify_indices(points: &[Vector2<f64>], tolerance: f64, first: usize, last: usize, keep: &mut Vec<bool>) {
    if last <= first + 1 {
        return;
    }
    let (farthest, max_distance) = (first + 1..last)
        .map(|i| (i, distance_to_line(&points[i], &points[first], &points[last])))
        .fold((first, -1.0), |best, candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        });
    if max_distance > tolerance {
        keep[farthest] = true;
        simplify_indices(points, tolerance, first, farthest, keep);
        simplify_indices(points, tolerance, farthest, last, keep);
    }
}

/// Douglas-Peucker simplification of an open polyline. The first and last vertex are always kept
pub fn simplify_polyline(points: &[Vector2<f64>], tolerance: f64) -> Vec<Vector2<f64>> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    simplify_indices(points, tolerance, 0, points.len() - 1, &mut keep);
    points
        .iter()
        .zip(keep.iter())
        .filter(|(_, keep)| **keep)
        .map(|(p, _)| *p)
        .collect()
}

/// Douglas-Peucker simplification of a closed ring (first vertex repeated at the end).
///
/// The ring is treated as a polyline starting and ending at its first vertex, so the first split happens
/// at the vertex farthest away from it. Rings with fewer than five distinct vertices are returned unchanged.
/// The result is always closed.
///
/// # Examples
/// ```
/// # use cloudshape_algorithms::simplify::simplify_ring;
/// # use cloudshape_core::nalgebra::Vector2;
/// let ring = vec![
///     Vector2::new(0.0, 0.0),
///     Vector2::new(5.0, 0.1),
///     Vector2::new(10.0, 0.0),
///     Vector2::new(10.0, 10.0),
///     Vector2::new(0.0, 10.0),
///     Vector2::new(0.0, 0.0),
/// ];
/// let simplified = simplify_ring(&ring, 0.5);
/// assert_eq!(simplified.len(), 5);
/// assert_eq!(simplified.first(), simplified.last());
/// ```
pub fn simplify_ring(ring: &[Vector2<f64>], tolerance: f64) -> Vec<Vector2<f64>> {
    let mut closed = ring.to_vec();
    if let (Some(first), Some(last)) = (closed.first().copied(), closed.last().copied()) {
        if first != last {
            closed.push(first);
        }
    }
    if closed.len() < 6 {
        return closed;
    }
    simplify_polyline(&closed, tolerance)
}
