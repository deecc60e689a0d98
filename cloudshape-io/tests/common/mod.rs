use cloudshape_core::{containers::PointCloud, nalgebra::Vector3};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Roofs about 10 m above a flat ground plane at Z = 0. Every roof is `(x, y, width, depth, points)`
pub fn roofs_with_ground(roofs: &[(f64, f64, f64, f64, usize)], ground_points: usize) -> PointCloud {
    let mut rng = StdRng::seed_from_u64(1234);
    let mut positions = vec![];
    for &(x, y, width, depth, count) in roofs {
        for _ in 0..count {
            positions.push(Vector3::new(
                x + rng.gen_range(0.0..width),
                y + rng.gen_range(0.0..depth),
                rng.gen_range(9.5..10.5),
            ));
        }
    }
    for _ in 0..ground_points {
        positions.push(Vector3::new(
            rng.gen_range(-20.0..120.0),
            rng.gen_range(-20.0..120.0),
            0.0,
        ));
    }
    PointCloud::from_positions(positions)
}
