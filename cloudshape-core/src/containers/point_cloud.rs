use nalgebra::{Point3, Vector2, Vector3};

use crate::math::AABB;

/// Ordered collection of 3D positions in a projected, metric coordinate system
///
/// Filtering stages never mutate a `PointCloud` in place, they build a new one through
/// [select](PointCloud::select) or by collecting an iterator
/// ```
/// # use cloudshape_core::containers::PointCloud;
/// # use cloudshape_core::nalgebra::Vector3;
/// let cloud: PointCloud = (0..4).map(|i| Vector3::new(i as f64, 0.0, 1.0)).collect();
/// let subset = cloud.select(&[1, 3]);
/// assert_eq!(subset.len(), 2);
/// assert_eq!(subset.at(1), Vector3::new(3.0, 0.0, 1.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    positions: Vec<Vector3<f64>>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
        }
    }

    pub fn from_positions(positions: Vec<Vector3<f64>>) -> Self {
        Self { positions }
    }

    pub fn push(&mut self, position: Vector3<f64>) {
        self.positions.push(position);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the position at `index`. Panics if `index` is out of bounds
    pub fn at(&self, index: usize) -> Vector3<f64> {
        self.positions[index]
    }

    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vector3<f64>> {
        self.positions.iter()
    }

    /// Creates a new `PointCloud` from the points at the given indices, in the order of `indices`
    pub fn select(&self, indices: &[usize]) -> PointCloud {
        indices.iter().map(|idx| self.positions[*idx]).collect()
    }

    /// Projection of all positions onto the XY plane
    pub fn xy(&self) -> Vec<Vector2<f64>> {
        self.positions.iter().map(|p| p.xy()).collect()
    }

    pub fn xy_arrays(&self) -> Vec<[f64; 2]> {
        self.positions.iter().map(|p| [p.x, p.y]).collect()
    }

    pub fn xyz_arrays(&self) -> Vec<[f64; 3]> {
        self.positions.iter().map(|p| [p.x, p.y, p.z]).collect()
    }

    pub fn z_values(&self) -> Vec<f64> {
        self.positions.iter().map(|p| p.z).collect()
    }

    pub fn bounds(&self) -> Option<AABB<f64>> {
        let points: Vec<Point3<f64>> = self.positions.iter().map(|p| Point3::from(*p)).collect();
        AABB::from_points(points.iter())
    }

    /// Arithmetic mean of all positions, or `None` for an empty cloud
    pub fn centroid(&self) -> Option<Vector3<f64>> {
        if self.is_empty() {
            return None;
        }
        let sum = self
            .positions
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p);
        Some(sum / self.len() as f64)
    }

    /// Minimum and maximum Z value, or `None` for an empty cloud
    pub fn z_range(&self) -> Option<(f64, f64)> {
        let first = self.positions.first()?.z;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(min, max), p| (min.min(p.z), max.max(p.z))),
        )
    }
}

impl FromIterator<Vector3<f64>> for PointCloud {
    fn from_iter<T: IntoIterator<Item = Vector3<f64>>>(iter: T) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Vector3<f64>;
    type IntoIter = std::slice::Iter<'a, Vector3<f64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.positions.iter()
    }
}

impl From<Vec<Vector3<f64>>> for PointCloud {
    fn from(positions: Vec<Vector3<f64>>) -> Self {
        Self::from_positions(positions)
    }
}
