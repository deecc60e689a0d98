use cloudshape_core::{containers::PointCloud, nalgebra::Vector3};

use crate::{
    config::{CentroidConfig, QualityConfig},
    instances::{AcceptedInstanceSet, InstanceGeometry, QualityAssessment, RejectionCounts, RejectionReason},
};

/// Centroid detection derived from one cluster
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidCandidate {
    pub label: usize,
    pub point_count: usize,
    pub centroid: Vector3<f64>,
    /// Vertical extent of the cluster points
    pub height_m: f64,
}

impl CentroidCandidate {
    /// Returns `None` for an empty cluster
    pub fn from_cluster(label: usize, points: &PointCloud) -> Option<Self> {
        let centroid = points.centroid()?;
        let (min_z, max_z) = points.z_range()?;
        Some(Self {
            label,
            point_count: points.len(),
            centroid,
            height_m: max_z - min_z,
        })
    }
}

/// Weighted plausibility score of a detection. The point count contributes 50 %, the relative height
/// 30 % and the vertical point density 20 %. A valid point count scores 1 (else 0), an invalid height
/// scores 0.5 and an invalid density 0.7
pub fn assess_quality(
    candidate: &CentroidCandidate,
    ground_z: f64,
    point_count_valid: bool,
    config: &QualityConfig,
) -> QualityAssessment {
    let relative_height_m = candidate.centroid.z - ground_z;
    let vertical_density = candidate.point_count as f64 / relative_height_m.max(1.0);

    let count_factor = if point_count_valid { 1.0 } else { 0.0 };
    let height_factor = if (config.min_relative_height_m..=config.max_relative_height_m)
        .contains(&relative_height_m)
    {
        1.0
    } else {
        0.5
    };
    let density_factor = if (config.min_vertical_density..=config.max_vertical_density)
        .contains(&vertical_density)
    {
        1.0
    } else {
        0.7
    };

    QualityAssessment {
        relative_height_m,
        vertical_density,
        score: 0.5 * count_factor + 0.3 * height_factor + 0.2 * density_factor,
    }
}

/// Filters centroid detections: point count bounds, optional quality score and optional proximity
/// deduplication. Deduplication visits detections by descending point count and drops every detection
/// whose XY distance to an already kept one is below the configured distance
#[derive(Debug, Clone, Copy)]
pub struct CentroidFilter {
    config: CentroidConfig,
}

impl CentroidFilter {
    pub fn new(config: CentroidConfig) -> Self {
        Self { config }
    }

    fn check_point_count(&self, point_count: usize) -> Result<(), RejectionReason> {
        if point_count < self.config.min_points {
            return Err(RejectionReason::TooFewPoints);
        }
        match self.config.max_points {
            Some(max_points) if point_count > max_points => Err(RejectionReason::TooManyPoints),
            _ => Ok(()),
        }
    }

    /// `candidates` are expected in ascending label order. `ground_z` is the local ground level, i.e. the
    /// lowest Z value of the loaded point cloud
    pub fn apply(
        &self,
        candidates: Vec<CentroidCandidate>,
        ground_z: f64,
        rejections: &mut RejectionCounts,
    ) -> AcceptedInstanceSet {
        let mut valid = vec![];
        for candidate in candidates {
            let count_check = self.check_point_count(candidate.point_count);
            let quality = self
                .config
                .quality
                .map(|quality| (assess_quality(&candidate, ground_z, count_check.is_ok(), &quality), quality.min_score));
            if let Err(reason) = count_check {
                log::debug!("Centroid {} rejected: {}", candidate.label, reason);
                rejections.record(reason);
                continue;
            }
            if let Some((assessment, min_score)) = quality {
                if assessment.score < min_score {
                    log::debug!(
                        "Centroid {} rejected: quality {:.3} < {}",
                        candidate.label,
                        assessment.score,
                        min_score
                    );
                    rejections.record(RejectionReason::PoorQuality);
                    continue;
                }
            }
            valid.push((candidate, quality.map(|(assessment, _)| assessment)));
        }

        if self.config.dedup_distance_m.is_some() {
            // stable sort, equal counts keep their label order
            valid.sort_by(|a, b| b.0.point_count.cmp(&a.0.point_count));
        }

        let mut accepted = AcceptedInstanceSet::new();
        for (candidate, quality) in valid {
            let reference_point = candidate.centroid.xy();
            if let Some(min_distance) = self.config.dedup_distance_m {
                if matches!(accepted.nearest_distance(&reference_point), Some(d) if d < min_distance) {
                    log::debug!("Centroid {} rejected: duplicate", candidate.label);
                    rejections.record(RejectionReason::Duplicate);
                    continue;
                }
            }
            accepted.accept(
                candidate.point_count,
                InstanceGeometry::Centroid {
                    position: candidate.centroid,
                    height_m: candidate.height_m,
                    quality,
                },
                reference_point,
            );
        }
        accepted
    }
}
