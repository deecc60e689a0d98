use cloudshape_core::{
    containers::PointCloud,
    error::{PipelineError, Result},
    math::percentile,
};

/// Removes low points (ground, low returns) from `cloud`. Computes the `percentile`-th percentile of all
/// Z values and keeps only points that lie strictly above it. Returns the filtered cloud together with
/// the threshold that was used, or `None` as threshold if `cloud` is empty
///
/// ```
/// # use cloudshape_algorithms::height_filter::height_filter;
/// # use cloudshape_core::{containers::PointCloud, nalgebra::Vector3};
/// let cloud: PointCloud = (0..=10).map(|z| Vector3::new(0.0, 0.0, z as f64)).collect();
/// let (filtered, threshold) = height_filter(&cloud, 20.0).unwrap();
/// assert_eq!(threshold, Some(2.0));
/// assert_eq!(filtered.len(), 8);
/// ```
pub fn height_filter(cloud: &PointCloud, percentile_p: f64) -> Result<(PointCloud, Option<f64>)> {
    if !(0.0..=100.0).contains(&percentile_p) {
        return Err(PipelineError::Config(format!(
            "height percentile must be within [0, 100], got {}",
            percentile_p
        )));
    }
    let threshold = match percentile(&cloud.z_values(), percentile_p) {
        Some(threshold) => threshold,
        None => return Ok((PointCloud::new(), None)),
    };
    let filtered = cloud.iter().filter(|p| p.z > threshold).copied().collect();
    Ok((filtered, Some(threshold)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudshape_core::nalgebra::Vector3;

    #[test]
    fn test_points_at_threshold_are_removed() {
        let cloud = PointCloud::from_positions(vec![
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, 0.0, 5.0),
        ]);
        let (filtered, threshold) = height_filter(&cloud, 50.0).unwrap();
        assert_eq!(threshold, Some(1.0));
        assert_eq!(filtered.positions(), &[Vector3::new(0.0, 0.0, 5.0)]);
    }

    #[test]
    fn test_flat_cloud_is_emptied() {
        let cloud: PointCloud = (0..50).map(|i| Vector3::new(i as f64, 0.0, 3.0)).collect();
        let (filtered, _) = height_filter(&cloud, 20.0).unwrap();
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_empty_and_invalid_input() {
        let (filtered, threshold) = height_filter(&PointCloud::new(), 10.0).unwrap();
        assert!(filtered.is_empty());
        assert!(threshold.is_none());
        assert!(height_filter(&PointCloud::new(), -1.0).is_err());
    }
}
