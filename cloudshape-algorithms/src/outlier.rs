use cloudshape_core::{containers::PointCloud, math::mean_and_std_dev};
use kd_tree::KdTree;
use rayon::prelude::*;

/// Result of the statistical outlier filter
#[derive(Debug, Clone)]
pub struct OutlierFilterResult {
    pub inliers: PointCloud,
    /// Mean over all per-point mean neighbour distances
    pub mean_distance: f64,
    /// Points with a mean neighbour distance above this value were discarded
    pub threshold: f64,
}

/// Mean XY distance of every point to its `k` nearest neighbours (the point itself excluded).
/// `k` is clamped to the number of other points
pub fn mean_neighbour_distances(points: &[[f64; 2]], k: usize) -> Vec<f64> {
    if points.len() < 2 || k == 0 {
        return vec![0.0; points.len()];
    }
    let k = k.min(points.len() - 1);
    let kd_tree = KdTree::build_by_ordered_float(points.to_vec());

    points
        .par_iter()
        .map(|point| {
            // the closest result is the query point itself
            let nearest = kd_tree.nearests(point, k + 1);
            let sum: f64 = nearest
                .iter()
                .skip(1)
                .map(|neighbour| neighbour.squared_distance.sqrt())
                .sum();
            sum / k as f64
        })
        .collect()
}

/// Statistical outlier removal on the XY projection of `cloud`. For every point the mean distance to its
/// `k` nearest neighbours is computed, then all points whose mean distance exceeds
/// `mean + factor * std_dev` are removed. The kept points retain their Z coordinate and their order
pub fn statistical_outlier_filter(cloud: &PointCloud, k: usize, factor: f64) -> OutlierFilterResult {
    let distances = mean_neighbour_distances(&cloud.xy_arrays(), k);
    let (mean_distance, std_dev) = match mean_and_std_dev(&distances) {
        Some(stats) => stats,
        None => {
            return OutlierFilterResult {
                inliers: PointCloud::new(),
                mean_distance: 0.0,
                threshold: 0.0,
            }
        }
    };
    let threshold = mean_distance + factor * std_dev;

    let inliers = cloud
        .iter()
        .zip(distances.iter())
        .filter(|(_, distance)| **distance <= threshold)
        .map(|(p, _)| *p)
        .collect();

    OutlierFilterResult {
        inliers,
        mean_distance,
        threshold,
    }
}
