use std::collections::HashMap;

use cloudshape_core::{
    containers::PointCloud,
    error::{PipelineError, Result},
};

fn voxel_of(p: &cloudshape_core::nalgebra::Vector3<f64>, voxel_size: f64) -> (i64, i64, i64) {
    (
        (p.x / voxel_size).floor() as i64,
        (p.y / voxel_size).floor() as i64,
        (p.z / voxel_size).floor() as i64,
    )
}

/// Downsamples `cloud` by keeping exactly one point per occupied voxel of edge length `voxel_size`.
/// The kept point is the first point of `cloud` that falls into the voxel. The result is ordered by
/// voxel coordinate (lexicographically by x, y and z cell index), so it is deterministic for a fixed input.
///
/// # Examples
/// ```
/// # use cloudshape_algorithms::voxel_grid::voxel_grid_filter;
/// # use cloudshape_core::{containers::PointCloud, nalgebra::Vector3};
/// let mut cloud = PointCloud::new();
/// for i in 0..100 {
///     for j in 0..100 {
///         cloud.push(Vector3::new(0.0, f64::from(i) * 0.1, f64::from(j) * 0.1));
///     }
/// }
/// let filtered = voxel_grid_filter(&cloud, 1.0).unwrap();
/// assert_eq!(filtered.len(), 100);
/// ```
pub fn voxel_grid_filter(cloud: &PointCloud, voxel_size: f64) -> Result<PointCloud> {
    if !(voxel_size.is_finite() && voxel_size > 0.0) {
        return Err(PipelineError::Config(format!(
            "voxel size must be positive, got {}",
            voxel_size
        )));
    }

    let mut first_points: HashMap<(i64, i64, i64), usize> = HashMap::with_capacity(cloud.len() / 4);
    for (i, p) in cloud.iter().enumerate() {
        // the first point of a voxel wins
        first_points.entry(voxel_of(p, voxel_size)).or_insert(i);
    }

    let mut voxels: Vec<((i64, i64, i64), usize)> = first_points.into_iter().collect();
    voxels.sort_unstable_by_key(|(pos, _)| *pos);

    Ok(voxels.iter().map(|(_, first_point)| cloud.at(*first_point)).collect())
}
