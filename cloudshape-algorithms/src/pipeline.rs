use std::time::{Duration, Instant};

use cloudshape_core::{
    containers::PointCloud,
    error::{PipelineError, Result},
};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::{
    centroid::{CentroidCandidate, CentroidFilter},
    config::{
        CandidateOrder, CentroidConfig, ClassConfig, ClusterSpace, GeometryConfig, LineConfig,
        PolygonConfig,
    },
    convexhull::convex_hull_area,
    footprint::FootprintBuilder,
    height_filter::height_filter,
    instances::{
        AcceptedInstanceSet, Instance, InstanceGeometry, PolygonCandidate, PolygonFilter,
        RejectionCounts, RejectionReason,
    },
    line::{LineCandidate, LineFilter},
    metrics::{point_density, GeometryMetrics},
    outlier::statistical_outlier_filter,
    segmentation::{Cluster, Dbscan},
    voxel_grid::voxel_grid_filter,
};

/// Point counts after each stage of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub input_points: usize,
    pub voxel_filtered_points: usize,
    pub height_filtered_points: usize,
    pub clean_points: usize,
    pub clusters_found: usize,
    pub noise_points: usize,
}

/// Typed result of one extraction run for one (chunk, class) pair
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub class: String,
    pub chunk: String,
    pub config: ClassConfig,
    pub stages: StageCounts,
    pub instances: Vec<Instance>,
    pub rejections: RejectionCounts,
    /// Set if the run ended early because too few points were left
    pub stopped_early: Option<String>,
    pub processing_time: Duration,
}

impl ExtractionReport {
    fn new(class: &str, chunk: &str, config: ClassConfig) -> Self {
        Self {
            class: class.to_string(),
            chunk: chunk.to_string(),
            config,
            stages: StageCounts::default(),
            instances: vec![],
            rejections: RejectionCounts::new(),
            stopped_early: None,
            processing_time: Duration::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Tag describing how the instances of this run were derived
    pub fn extraction_method(&self) -> &'static str {
        match self.config.geometry {
            GeometryConfig::Polygon(_) => "dbscan_footprint",
            GeometryConfig::Centroid(_) => "dbscan_centroid",
            GeometryConfig::Line(_) => "dbscan_principal_axis",
        }
    }

    pub fn total_area_m2(&self) -> f64 {
        self.instances
            .iter()
            .map(|instance| match &instance.geometry {
                InstanceGeometry::Polygon { metrics, .. } => metrics.area_m2,
                _ => 0.0,
            })
            .sum()
    }

    pub fn total_length_m(&self) -> f64 {
        self.instances
            .iter()
            .map(|instance| match &instance.geometry {
                InstanceGeometry::Line { metrics, .. } => metrics.length_m,
                _ => 0.0,
            })
            .sum()
    }
}

fn require_points(stage: &'static str, remaining: usize, required: usize) -> Result<()> {
    if remaining < required {
        return Err(PipelineError::InsufficientData {
            stage,
            remaining,
            required,
        });
    }
    Ok(())
}

/// The instance extraction pipeline for one class configuration
///
/// Runs density reduction, ground removal, outlier removal and DBSCAN on a loaded point cloud and turns the
/// resulting clusters into accepted polygons, centroids or lines. Running out of points in any stage is
/// not an error, it produces a report without instances.
///
/// ```
/// # use cloudshape_algorithms::{config::ClassConfig, pipeline::InstanceExtractor};
/// # use cloudshape_core::containers::PointCloud;
/// let extractor = InstanceExtractor::new(ClassConfig::buildings()).unwrap();
/// let report = extractor.extract(&PointCloud::new(), "6_Buildings", "chunk_1").unwrap();
/// assert!(report.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct InstanceExtractor {
    config: ClassConfig,
}

impl InstanceExtractor {
    /// Fails with a configuration error if `config` is invalid
    pub fn new(config: ClassConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClassConfig {
        &self.config
    }

    pub fn extract(&self, cloud: &PointCloud, class: &str, chunk: &str) -> Result<ExtractionReport> {
        let start = Instant::now();
        let mut report = ExtractionReport::new(class, chunk, self.config);
        match self.run_stages(cloud, &mut report) {
            Ok(()) => {}
            Err(err @ PipelineError::InsufficientData { .. }) => {
                info!("{}: {}", class, err);
                report.stopped_early = Some(err.to_string());
            }
            Err(err) => return Err(err),
        }
        report.processing_time = start.elapsed();
        info!(
            "{}: extracted {} instances from {} points in {:.2}s ({} candidates rejected)",
            class,
            report.instances.len(),
            report.stages.input_points,
            report.processing_time.as_secs_f64(),
            report.rejections.total()
        );
        Ok(report)
    }

    fn run_stages(&self, cloud: &PointCloud, report: &mut ExtractionReport) -> Result<()> {
        report.stages.input_points = cloud.len();
        let ground_z = cloud.z_range().map(|(min, _)| min).unwrap_or(0.0);

        let reduced = match self.config.voxel_size_m {
            Some(voxel_size) => {
                let reduced = voxel_grid_filter(cloud, voxel_size)?;
                info!(
                    "Voxel grid ({} m): {} -> {} points",
                    voxel_size,
                    cloud.len(),
                    reduced.len()
                );
                reduced
            }
            None => cloud.clone(),
        };
        report.stages.voxel_filtered_points = reduced.len();

        let elevated = match &self.config.height_filter {
            Some(config) => {
                let (elevated, threshold) = height_filter(&reduced, config.percentile)?;
                info!(
                    "Height filter (p{}, threshold {:.2}): {} -> {} points",
                    config.percentile,
                    threshold.unwrap_or(f64::NAN),
                    reduced.len(),
                    elevated.len()
                );
                report.stages.height_filtered_points = elevated.len();
                require_points("height filter", elevated.len(), config.min_remaining_points)?;
                elevated
            }
            None => {
                report.stages.height_filtered_points = reduced.len();
                reduced
            }
        };

        let clean = match &self.config.outlier_filter {
            Some(config) => {
                let result =
                    statistical_outlier_filter(&elevated, config.k_neighbours, config.std_dev_factor);
                info!(
                    "Outlier filter (k = {}, mean distance {:.2}, threshold {:.2}): {} -> {} points",
                    config.k_neighbours,
                    result.mean_distance,
                    result.threshold,
                    elevated.len(),
                    result.inliers.len()
                );
                report.stages.clean_points = result.inliers.len();
                require_points("outlier filter", result.inliers.len(), config.min_remaining_points)?;
                result.inliers
            }
            None => {
                report.stages.clean_points = elevated.len();
                elevated
            }
        };

        let dbscan = Dbscan::new(self.config.clustering.eps_m, self.config.clustering.min_samples);
        let clustering = match self.config.clustering.space {
            ClusterSpace::Planar => dbscan.cluster(&clean.xy_arrays()),
            ClusterSpace::Spatial => dbscan.cluster(&clean.xyz_arrays()),
        };
        report.stages.clusters_found = clustering.clusters.len();
        report.stages.noise_points = clustering.noise_count;
        info!(
            "DBSCAN (eps {} m, min samples {}): {} clusters, {} noise points",
            dbscan.eps(),
            dbscan.min_samples(),
            clustering.clusters.len(),
            clustering.noise_count
        );

        let accepted = match &self.config.geometry {
            GeometryConfig::Polygon(config) => {
                extract_polygons(&clean, clustering.clusters, config, &mut report.rejections)
            }
            GeometryConfig::Centroid(config) => extract_centroids(
                &clean,
                &clustering.clusters,
                config,
                ground_z,
                &mut report.rejections,
            ),
            GeometryConfig::Line(config) => {
                extract_lines(&clean, &clustering.clusters, config, &mut report.rejections)
            }
        };
        report.instances = accepted.into_instances();
        Ok(())
    }
}

fn record_rejection(rejections: &mut RejectionCounts, label: usize, reason: RejectionReason) {
    debug!("Cluster {} rejected: {}", label, reason);
    rejections.record(reason);
}

/// Orders `clusters` for the greedy overlap check
pub fn order_candidates(clusters: &mut [Cluster], order: CandidateOrder) {
    match order {
        CandidateOrder::ByLabel => clusters.sort_by_key(|c| c.label),
        CandidateOrder::LargestFirst => {
            clusters.sort_by(|a, b| b.len().cmp(&a.len()).then(a.label.cmp(&b.label)))
        }
    }
}

fn extract_polygons(
    clean: &PointCloud,
    mut clusters: Vec<Cluster>,
    config: &PolygonConfig,
    rejections: &mut RejectionCounts,
) -> AcceptedInstanceSet {
    order_candidates(&mut clusters, config.candidate_order);
    let builder = FootprintBuilder::with_fallbacks(config.concave_hull);
    let filter = PolygonFilter::new(*config);

    // footprints are independent of each other, only the acceptance below is order dependent
    let candidates: Vec<(usize, std::result::Result<PolygonCandidate, RejectionReason>)> = clusters
        .par_iter()
        .map(|cluster| {
            let points = clean.select(&cluster.indices).xy();
            let hull_area = convex_hull_area(&points);
            let candidate = filter
                .check_cluster(points.len(), point_density(points.len(), hull_area))
                .and_then(|_| {
                    builder.build(&points).map_err(|err| {
                        warn!("Cluster {}: {}", cluster.label, err);
                        RejectionReason::InvalidPolygon
                    })
                })
                .map(|footprint| {
                    let metrics = GeometryMetrics::compute(
                        &footprint.footprint,
                        points.len(),
                        hull_area,
                        config.aspect_method,
                    );
                    PolygonCandidate {
                        label: cluster.label,
                        point_count: points.len(),
                        footprint,
                        metrics,
                    }
                });
            (cluster.label, candidate)
        })
        .collect();

    let mut accepted = AcceptedInstanceSet::new();
    for (label, candidate) in candidates {
        match candidate.and_then(|candidate| filter.accept(candidate, &mut accepted)) {
            Ok(instance) => {
                if let InstanceGeometry::Polygon {
                    method, metrics, ..
                } = &instance.geometry
                {
                    info!(
                        "Polygon {} from cluster {}: {} points, {:.1} m2, aspect {:.2} ({})",
                        instance.id,
                        label,
                        instance.point_count,
                        metrics.area_m2,
                        metrics.aspect_ratio,
                        method
                    );
                }
            }
            Err(reason) => record_rejection(rejections, label, reason),
        }
    }
    accepted
}

fn extract_centroids(
    clean: &PointCloud,
    clusters: &[Cluster],
    config: &CentroidConfig,
    ground_z: f64,
    rejections: &mut RejectionCounts,
) -> AcceptedInstanceSet {
    let candidates = clusters
        .iter()
        .filter_map(|cluster| CentroidCandidate::from_cluster(cluster.label, &clean.select(&cluster.indices)))
        .collect();
    let accepted = CentroidFilter::new(*config).apply(candidates, ground_z, rejections);
    info!("{} centroids accepted", accepted.len());
    accepted
}

fn extract_lines(
    clean: &PointCloud,
    clusters: &[Cluster],
    config: &LineConfig,
    rejections: &mut RejectionCounts,
) -> AcceptedInstanceSet {
    let filter = LineFilter::new(*config);
    let mut accepted = AcceptedInstanceSet::new();
    for cluster in clusters {
        if let Err(reason) = filter.check_point_count(cluster.len()) {
            record_rejection(rejections, cluster.label, reason);
            continue;
        }
        let candidate = match LineCandidate::fit(cluster.label, &clean.select(&cluster.indices), config) {
            Some(candidate) => candidate,
            None => {
                record_rejection(rejections, cluster.label, RejectionReason::TooFewPoints);
                continue;
            }
        };
        match filter.accept(candidate, &mut accepted) {
            Ok(instance) => {
                if let InstanceGeometry::Line { metrics, .. } = &instance.geometry {
                    info!(
                        "Line {} from cluster {}: {:.1} m long, aspect {:.1}",
                        instance.id, cluster.label, metrics.length_m, metrics.aspect_ratio
                    );
                }
            }
            Err(reason) => record_rejection(rejections, cluster.label, reason),
        }
    }
    accepted
}
