use float_ord::FloatOrd;

/// Computes the `p`-th percentile (0 to 100) of `values` using linear interpolation between the two
/// closest ranks. Returns `None` for an empty slice or a percentile outside of [0, 100]
/// ```
/// # use cloudshape_core::math::percentile;
/// assert_eq!(percentile(&[4.0, 1.0, 3.0, 2.0, 5.0], 50.0), Some(3.0));
/// assert_eq!(percentile(&[0.0, 10.0], 25.0), Some(2.5));
/// ```
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by_key(|v| FloatOrd(*v));

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Mean and population standard deviation of `values`, or `None` if `values` is empty
pub fn mean_and_std_dev(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}
