use std::collections::HashMap;

/// Squared euclidean distance between two `D`-dimensional coordinates
pub fn distance_squared<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Uniform hash grid over `D`-dimensional coordinates for fixed-radius neighbour queries
///
/// Points are bucketed into cubic cells of edge length `cell_size`. A radius query visits every cell
/// that can contain a point within the radius, so the radius may be larger than the cell size. Query
/// results always include points exactly at distance `radius`.
/// ```
/// # use cloudshape_core::containers::GridIndex;
/// let index = GridIndex::new(vec![[0.0, 0.0], [1.0, 0.0], [5.0, 5.0]], 1.0);
/// assert_eq!(index.within_radius(&[0.0, 0.0], 1.0), vec![0, 1]);
/// assert_eq!(index.count_within_radius(&[5.0, 4.0], 0.5), 0);
/// ```
#[derive(Debug, Clone)]
pub struct GridIndex<const D: usize> {
    cell_size: f64,
    points: Vec<[f64; D]>,
    cells: HashMap<[i64; D], Vec<usize>>,
}

impl<const D: usize> GridIndex<D> {
    /// Builds the index. Panics if `cell_size` is not a positive, finite number
    pub fn new(points: Vec<[f64; D]>, cell_size: f64) -> Self {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            panic!("GridIndex::new: cell size must be positive and finite, got {cell_size}");
        }
        let mut cells: HashMap<[i64; D], Vec<usize>> = HashMap::new();
        for (idx, point) in points.iter().enumerate() {
            cells
                .entry(Self::cell_of(point, cell_size))
                .or_default()
                .push(idx);
        }
        Self {
            cell_size,
            points,
            cells,
        }
    }

    fn cell_of(point: &[f64; D], cell_size: f64) -> [i64; D] {
        let mut cell = [0i64; D];
        for (dim, coordinate) in point.iter().enumerate() {
            cell[dim] = (coordinate / cell_size).floor() as i64;
        }
        cell
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[[f64; D]] {
        &self.points
    }

    pub fn point(&self, index: usize) -> &[f64; D] {
        &self.points[index]
    }

    /// Calls `visitor` with the index of every point within `radius` of `query` (inclusive)
    pub fn for_each_within_radius<F: FnMut(usize)>(&self, query: &[f64; D], radius: f64, mut visitor: F) {
        if D == 0 || radius < 0.0 {
            return;
        }
        let reach = (radius / self.cell_size).ceil() as i64;
        let center = Self::cell_of(query, self.cell_size);
        let radius_squared = radius * radius;

        let mut offset = [-reach; D];
        loop {
            let mut cell = center;
            for dim in 0..D {
                cell[dim] += offset[dim];
            }
            if let Some(bucket) = self.cells.get(&cell) {
                for &idx in bucket {
                    if distance_squared(&self.points[idx], query) <= radius_squared {
                        visitor(idx);
                    }
                }
            }

            // odometer-style advance over all cell offsets in [-reach, reach]^D
            let mut dim = 0;
            loop {
                if dim == D {
                    return;
                }
                offset[dim] += 1;
                if offset[dim] > reach {
                    offset[dim] = -reach;
                    dim += 1;
                } else {
                    break;
                }
            }
        }
    }

    /// Indices of all points within `radius` of `query` (inclusive), sorted ascending
    pub fn within_radius(&self, query: &[f64; D], radius: f64) -> Vec<usize> {
        let mut neighbours = vec![];
        self.for_each_within_radius(query, radius, |idx| neighbours.push(idx));
        neighbours.sort_unstable();
        neighbours
    }

    pub fn count_within_radius(&self, query: &[f64; D], radius: f64) -> usize {
        let mut count = 0;
        self.for_each_within_radius(query, radius, |_| count += 1);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn brute_force<const D: usize>(points: &[[f64; D]], query: &[f64; D], radius: f64) -> Vec<usize> {
        points
            .iter()
            .enumerate()
            .filter(|(_, p)| distance_squared(p, query) <= radius * radius)
            .map(|(idx, _)| idx)
            .collect()
    }

    #[test]
    fn test_matches_brute_force_2d() {
        let mut rng = StdRng::seed_from_u64(7);
        let points: Vec<[f64; 2]> = (0..500)
            .map(|_| [rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0)])
            .collect();
        let index = GridIndex::new(points.clone(), 1.5);
        for query in points.iter().take(50) {
            for radius in [0.5, 1.5, 4.0] {
                assert_eq!(
                    index.within_radius(query, radius),
                    brute_force(&points, query, radius)
                );
            }
        }
    }

    #[test]
    fn test_matches_brute_force_3d() {
        let mut rng = StdRng::seed_from_u64(11);
        let points: Vec<[f64; 3]> = (0..300)
            .map(|_| {
                [
                    rng.gen_range(0.0..10.0),
                    rng.gen_range(0.0..10.0),
                    rng.gen_range(0.0..10.0),
                ]
            })
            .collect();
        let index = GridIndex::new(points.clone(), 2.0);
        let query = [5.0, 5.0, 5.0];
        assert_eq!(index.within_radius(&query, 2.5), brute_force(&points, &query, 2.5));
        assert_eq!(
            index.count_within_radius(&query, 2.5),
            brute_force(&points, &query, 2.5).len()
        );
    }

    #[test]
    fn test_radius_is_inclusive() {
        let index = GridIndex::new(vec![[0.0, 0.0], [3.0, 4.0]], 5.0);
        assert_eq!(index.within_radius(&[0.0, 0.0], 5.0), vec![0, 1]);
        assert_eq!(index.within_radius(&[0.0, 0.0], 4.99), vec![0]);
    }

    #[test]
    #[should_panic]
    fn test_zero_cell_size_panics() {
        GridIndex::new(vec![[0.0, 0.0]], 0.0);
    }
}
