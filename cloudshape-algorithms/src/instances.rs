use std::collections::BTreeMap;

use cloudshape_core::{
    geometry::Footprint,
    nalgebra::{Vector2, Vector3},
};
use serde::{Deserialize, Serialize};

use crate::{
    config::{OverlapReference, PolygonConfig},
    footprint::BuiltFootprint,
    line::LineMetrics,
    metrics::GeometryMetrics,
};

/// Why a candidate was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    TooFewPoints,
    TooManyPoints,
    TooSparse,
    InvalidPolygon,
    TooSmall,
    TooLarge,
    AspectRatio,
    Overlap,
    PoorQuality,
    Duplicate,
    TooShort,
    NotLinear,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::TooFewPoints => "too_few_points",
            RejectionReason::TooManyPoints => "too_many_points",
            RejectionReason::TooSparse => "too_sparse",
            RejectionReason::InvalidPolygon => "invalid_polygon",
            RejectionReason::TooSmall => "too_small",
            RejectionReason::TooLarge => "too_large",
            RejectionReason::AspectRatio => "aspect_ratio",
            RejectionReason::Overlap => "overlap",
            RejectionReason::PoorQuality => "poor_quality",
            RejectionReason::Duplicate => "duplicate",
            RejectionReason::TooShort => "too_short",
            RejectionReason::NotLinear => "not_linear",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of rejected candidates per reason
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    counts: BTreeMap<RejectionReason, usize>,
}

impl RejectionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, reason: RejectionReason) {
        *self.counts.entry(reason).or_insert(0) += 1;
    }

    pub fn get(&self, reason: RejectionReason) -> usize {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RejectionReason, usize)> + '_ {
        self.counts.iter().map(|(reason, count)| (*reason, *count))
    }
}

/// Geometry and geometry-specific properties of an accepted instance
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceGeometry {
    Polygon {
        footprint: Footprint,
        /// Name of the footprint strategy that produced the polygon
        method: &'static str,
        metrics: GeometryMetrics,
    },
    Centroid {
        position: Vector3<f64>,
        /// Vertical extent of the cluster
        height_m: f64,
        quality: Option<QualityAssessment>,
    },
    Line {
        /// XY vertices ordered along the principal axis
        vertices: Vec<Vector2<f64>>,
        metrics: LineMetrics,
    },
}

/// Plausibility of a centroid detection relative to the local ground level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityAssessment {
    pub relative_height_m: f64,
    /// Points per meter of relative height
    pub vertical_density: f64,
    pub score: f64,
}

/// One accepted output unit. Identifiers are sequential and start at 1 within a run
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub id: usize,
    pub point_count: usize,
    pub geometry: InstanceGeometry,
}

/// Instances accepted so far in one run, together with the reference points used for the overlap check
#[derive(Debug, Clone, Default)]
pub struct AcceptedInstanceSet {
    instances: Vec<Instance>,
    reference_points: Vec<Vector2<f64>>,
}

impl AcceptedInstanceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn into_instances(self) -> Vec<Instance> {
        self.instances
    }

    /// Distance from `point` to the closest reference point of an accepted instance
    pub fn nearest_distance(&self, point: &Vector2<f64>) -> Option<f64> {
        self.reference_points
            .iter()
            .map(|reference| (reference - point).norm())
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Appends a new instance and returns it. The identifier is assigned here
    pub fn accept(
        &mut self,
        point_count: usize,
        geometry: InstanceGeometry,
        reference_point: Vector2<f64>,
    ) -> &Instance {
        self.instances.push(Instance {
            id: self.instances.len() + 1,
            point_count,
            geometry,
        });
        self.reference_points.push(reference_point);
        &self.instances[self.instances.len() - 1]
    }
}

/// A cluster with a footprint, ready for validation
#[derive(Debug, Clone)]
pub struct PolygonCandidate {
    pub label: usize,
    pub point_count: usize,
    pub footprint: BuiltFootprint,
    pub metrics: GeometryMetrics,
}

/// Validates polygon candidates against a [PolygonConfig]
///
/// The checks run in a fixed order and the first failing check determines the rejection reason: point
/// count, point density, area range, aspect ratio and finally the greedy overlap check against all
/// previously accepted instances.
#[derive(Debug, Clone, Copy)]
pub struct PolygonFilter {
    config: PolygonConfig,
}

impl PolygonFilter {
    pub fn new(config: PolygonConfig) -> Self {
        Self { config }
    }

    /// Checks that only need the cluster points, before a footprint is built
    pub fn check_cluster(&self, point_count: usize, point_density: f64) -> Result<(), RejectionReason> {
        if point_count < self.config.min_points {
            return Err(RejectionReason::TooFewPoints);
        }
        if let Some(min_density) = self.config.min_point_density {
            if point_density < min_density {
                return Err(RejectionReason::TooSparse);
            }
        }
        Ok(())
    }

    pub fn check_metrics(&self, metrics: &GeometryMetrics) -> Result<(), RejectionReason> {
        if metrics.area_m2 < self.config.min_area_m2 {
            return Err(RejectionReason::TooSmall);
        }
        if metrics.area_m2 > self.config.max_area_m2 {
            return Err(RejectionReason::TooLarge);
        }
        if metrics.aspect_ratio > self.config.max_aspect_ratio {
            return Err(RejectionReason::AspectRatio);
        }
        Ok(())
    }

    pub fn reference_point(&self, footprint: &Footprint) -> Vector2<f64> {
        match self.config.overlap_reference {
            OverlapReference::BboxCenter => footprint.bbox_center(),
            OverlapReference::VertexCentroid => footprint.vertex_centroid(),
        }
    }

    pub fn check_overlap(
        &self,
        reference_point: &Vector2<f64>,
        accepted: &AcceptedInstanceSet,
    ) -> Result<(), RejectionReason> {
        match accepted.nearest_distance(reference_point) {
            Some(distance) if distance < self.config.min_overlap_distance_m => {
                Err(RejectionReason::Overlap)
            }
            _ => Ok(()),
        }
    }

    /// Runs all checks on `candidate` and appends it to `accepted` if it passes
    pub fn accept<'a>(
        &self,
        candidate: PolygonCandidate,
        accepted: &'a mut AcceptedInstanceSet,
    ) -> Result<&'a Instance, RejectionReason> {
        self.check_cluster(candidate.point_count, candidate.metrics.point_density)?;
        self.check_metrics(&candidate.metrics)?;
        let reference_point = self.reference_point(&candidate.footprint.footprint);
        self.check_overlap(&reference_point, accepted)?;
        Ok(accepted.accept(
            candidate.point_count,
            InstanceGeometry::Polygon {
                footprint: candidate.footprint.footprint,
                method: candidate.footprint.method,
                metrics: candidate.metrics,
            },
            reference_point,
        ))
    }
}
