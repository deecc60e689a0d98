use cloudshape_algorithms::{
    config::ClassConfig, footprint::FootprintBuilder, pipeline::InstanceExtractor,
    segmentation::Dbscan, voxel_grid::voxel_grid_filter,
};
use cloudshape_core::{containers::PointCloud, nalgebra::Vector3};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::{distributions::Uniform, rngs::StdRng, Rng, SeedableRng};

const NUM_BUILDINGS: usize = 25;
const POINTS_PER_BUILDING: usize = 2000;

/// A 5x5 grid of 15x10 m roofs, 40 m apart, plus ground points
fn get_dummy_city() -> PointCloud {
    let mut rng = StdRng::seed_from_u64(7);
    let mut positions = Vec::with_capacity(NUM_BUILDINGS * POINTS_PER_BUILDING * 2);
    for building in 0..NUM_BUILDINGS {
        let origin_x = (building % 5) as f64 * 40.0;
        let origin_y = (building / 5) as f64 * 40.0;
        for _ in 0..POINTS_PER_BUILDING {
            positions.push(Vector3::new(
                origin_x + rng.sample(Uniform::new(0.0, 15.0)),
                origin_y + rng.sample(Uniform::new(0.0, 10.0)),
                rng.sample(Uniform::new(8.0, 12.0)),
            ));
        }
    }
    for _ in 0..NUM_BUILDINGS * POINTS_PER_BUILDING {
        positions.push(Vector3::new(
            rng.sample(Uniform::new(-10.0, 200.0)),
            rng.sample(Uniform::new(-10.0, 200.0)),
            rng.sample(Uniform::new(0.0, 0.5)),
        ));
    }
    PointCloud::from_positions(positions)
}

fn bench(c: &mut Criterion) {
    let cloud = get_dummy_city();
    let extractor = InstanceExtractor::new(ClassConfig::buildings()).unwrap();
    c.bench_function("extract_buildings", |b| {
        b.iter(|| extractor.extract(&cloud, "6_Buildings", "bench").unwrap())
    });

    let mut rng = StdRng::seed_from_u64(11);
    let scattered: PointCloud = (0..800_000)
        .map(|_| {
            Vector3::new(
                rng.sample(Uniform::new(0.0, 200.0)),
                rng.sample(Uniform::new(0.0, 200.0)),
                rng.sample(Uniform::new(0.0, 30.0)),
            )
        })
        .collect();
    c.bench_function("voxel_grid_800k", |b| {
        b.iter(|| voxel_grid_filter(&scattered, 0.3).unwrap())
    });

    let xy = cloud.xy_arrays();
    let dbscan = Dbscan::new(5.0, 120);
    c.bench_function("dbscan_planar", |b| b.iter(|| dbscan.cluster(&xy)));

    let roof = cloud.select(&(0..POINTS_PER_BUILDING).collect::<Vec<_>>()).xy();
    let builder = FootprintBuilder::with_fallbacks(Default::default());
    c.bench_function("footprint_single_roof", |b| {
        b.iter(|| builder.build(&roof).unwrap())
    });
}

criterion_group! {
    name = extraction;
    config = Criterion::default().sample_size(20);
    targets = bench
}
criterion_main!(extraction);
