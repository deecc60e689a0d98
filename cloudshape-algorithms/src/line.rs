use cloudshape_core::{
    containers::PointCloud,
    nalgebra::{Matrix2, Vector2},
};
use float_ord::FloatOrd;

use crate::{
    config::LineConfig,
    instances::{AcceptedInstanceSet, Instance, InstanceGeometry, RejectionReason},
};

/// Direction of largest spread of a 2D point set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrincipalAxis {
    pub center: Vector2<f64>,
    /// Unit vector. The sign is normalized so that the direction points towards positive X (or positive Y
    /// for vertical axes)
    pub direction: Vector2<f64>,
}

impl PrincipalAxis {
    /// Fits the axis through the eigen decomposition of the 2x2 covariance matrix. Returns `None` for fewer
    /// than two points
    pub fn fit(points: &[Vector2<f64>]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let center = points.iter().fold(Vector2::zeros(), |acc, p| acc + p) / n;
        let covariance = points.iter().fold(Matrix2::zeros(), |acc, p| {
            let d = p - center;
            acc + d * d.transpose()
        }) / n;

        let eigen = covariance.symmetric_eigen();
        let largest = if eigen.eigenvalues[0] >= eigen.eigenvalues[1] {
            0
        } else {
            1
        };
        let mut direction: Vector2<f64> = eigen.eigenvectors.column(largest).into_owned();
        if direction.norm() == 0.0 {
            direction = Vector2::new(1.0, 0.0);
        }
        direction.normalize_mut();
        if direction.x < 0.0 || (direction.x == 0.0 && direction.y < 0.0) {
            direction = -direction;
        }
        Some(Self { center, direction })
    }

    pub fn perpendicular(&self) -> Vector2<f64> {
        Vector2::new(-self.direction.y, self.direction.x)
    }

    /// Signed position of `point` along the axis, relative to the center
    pub fn project(&self, point: &Vector2<f64>) -> f64 {
        (point - self.center).dot(&self.direction)
    }
}

/// Shape and height statistics of a line cluster
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineMetrics {
    /// Extent along the principal axis
    pub length_m: f64,
    /// Extent across the principal axis
    pub width_m: f64,
    pub aspect_ratio: f64,
    pub min_height_m: f64,
    pub max_height_m: f64,
    pub avg_height_m: f64,
}

/// A cluster fitted as a line, ready for validation
#[derive(Debug, Clone, PartialEq)]
pub struct LineCandidate {
    pub label: usize,
    pub point_count: usize,
    pub axis: PrincipalAxis,
    /// Sampled XY vertices, ordered along the axis
    pub vertices: Vec<Vector2<f64>>,
    pub metrics: LineMetrics,
}

fn extent(values: impl Iterator<Item = f64>) -> f64 {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    });
    if min.is_finite() {
        max - min
    } else {
        0.0
    }
}

/// Evenly spaced sample of `count` indices out of `0..len`, always including the first and last index
fn sample_indices(len: usize, count: usize) -> Vec<usize> {
    let count = count.min(len);
    match count {
        0 => vec![],
        1 => vec![0],
        _ => (0..count)
            .map(|i| i * (len - 1) / (count - 1))
            .collect(),
    }
}

impl LineCandidate {
    /// Fits a line through the cluster points. Returns `None` for fewer than two points
    pub fn fit(label: usize, points: &PointCloud, config: &LineConfig) -> Option<Self> {
        let xy = points.xy();
        let axis = PrincipalAxis::fit(&xy)?;
        let perpendicular = axis.perpendicular();

        let length_m = extent(xy.iter().map(|p| axis.project(p)));
        let width_m = extent(xy.iter().map(|p| (p - axis.center).dot(&perpendicular)));
        let aspect_ratio = length_m / width_m.max(config.min_width_m);

        let z_values = points.z_values();
        let (min_height_m, max_height_m) = points.z_range()?;
        let avg_height_m = z_values.iter().sum::<f64>() / z_values.len() as f64;

        let mut order: Vec<usize> = (0..xy.len()).collect();
        order.sort_by_key(|idx| FloatOrd(axis.project(&xy[*idx])));
        let vertices = sample_indices(order.len(), config.max_vertices)
            .into_iter()
            .map(|i| xy[order[i]])
            .collect();

        Some(Self {
            label,
            point_count: points.len(),
            axis,
            vertices,
            metrics: LineMetrics {
                length_m,
                width_m,
                aspect_ratio,
                min_height_m,
                max_height_m,
                avg_height_m,
            },
        })
    }
}

/// Validates line candidates: minimum point count, minimum length and minimum aspect ratio
#[derive(Debug, Clone, Copy)]
pub struct LineFilter {
    config: LineConfig,
}

impl LineFilter {
    pub fn new(config: LineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LineConfig {
        &self.config
    }

    pub fn check_point_count(&self, point_count: usize) -> Result<(), RejectionReason> {
        if point_count < self.config.min_points {
            Err(RejectionReason::TooFewPoints)
        } else {
            Ok(())
        }
    }

    pub fn check_metrics(&self, metrics: &LineMetrics) -> Result<(), RejectionReason> {
        if metrics.length_m < self.config.min_length_m {
            return Err(RejectionReason::TooShort);
        }
        if metrics.aspect_ratio < self.config.min_aspect_ratio {
            return Err(RejectionReason::NotLinear);
        }
        Ok(())
    }

    pub fn accept<'a>(
        &self,
        candidate: LineCandidate,
        accepted: &'a mut AcceptedInstanceSet,
    ) -> Result<&'a Instance, RejectionReason> {
        self.check_point_count(candidate.point_count)?;
        self.check_metrics(&candidate.metrics)?;
        Ok(accepted.accept(
            candidate.point_count,
            InstanceGeometry::Line {
                vertices: candidate.vertices,
                metrics: candidate.metrics,
            },
            candidate.axis.center,
        ))
    }
}
