use anyhow::Result;
use assert_approx_eq::assert_approx_eq;
use cloudshape_algorithms::{
    config::{ClassConfig, GeometryConfig, BUILDINGS, WIRES},
    metrics::AspectMethod,
    pipeline::InstanceExtractor,
};
use cloudshape_core::{containers::PointCloud, nalgebra::Vector3};
use cloudshape_io::geojson::{
    feature_collection, read_feature_collection, write_feature_collection, Geometry,
};

mod common;

#[test]
fn test_building_report_round_trip() -> Result<()> {
    let cloud = common::roofs_with_ground(&[(0.0, 0.0, 20.0, 12.0, 3000), (60.0, 60.0, 15.0, 15.0, 3000)], 8000);
    let mut config = ClassConfig::buildings();
    if let GeometryConfig::Polygon(polygon) = &mut config.geometry {
        polygon.aspect_method = AspectMethod::BoundingBox;
    }
    let report = InstanceExtractor::new(config)?.extract(&cloud, BUILDINGS, "chunk_3")?;
    assert_eq!(report.instances.len(), 2);

    let collection = feature_collection(&report)?;
    assert_eq!(collection.name, "6_Buildings_polygons");
    assert_eq!(collection.features.len(), 2);

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("6_Buildings/polygons/6_Buildings_polygons.geojson");
    write_feature_collection(&collection, &path)?;
    let parsed = read_feature_collection(&path)?;
    assert_eq!(parsed, collection);

    for (id, feature) in parsed.features.iter().enumerate() {
        assert_eq!(feature.properties["polygon_id"], id + 1);
        assert_eq!(feature.properties["class"], BUILDINGS);
        assert_eq!(feature.properties["chunk"], "chunk_3");
        match &feature.geometry {
            Geometry::Polygon { coordinates } => {
                assert_eq!(coordinates.len(), 1);
                let ring = &coordinates[0];
                assert!(ring.len() >= 4);
                assert_eq!(ring.first(), ring.last());
            }
            other => panic!("unexpected geometry {:?}", other),
        }
        assert!(feature.properties["area_m2"].as_f64().unwrap() > 0.0);
    }

    let results = &parsed.properties["results"];
    assert_eq!(results["input_points"], 14000);
    assert_eq!(results["instances"], 2);
    assert_approx_eq!(results["total_area_m2"].as_f64().unwrap(), report.total_area_m2());
    assert_eq!(parsed.properties["parameters"]["clustering"]["min_samples"], 120);
    Ok(())
}

#[test]
fn test_wire_report_features() -> Result<()> {
    let cloud: PointCloud = (0..400)
        .map(|i| Vector3::new(i as f64 * 0.25, 10.0 + 0.02 * (i % 3) as f64, 15.0 + 0.01 * (i % 5) as f64))
        .chain((0..200).map(|i| Vector3::new((i % 20) as f64 * 5.0, (i / 20) as f64 * 2.0, 0.0)))
        .collect();
    let report = InstanceExtractor::new(ClassConfig::wires())?.extract(&cloud, WIRES, "chunk_3")?;
    assert_eq!(report.instances.len(), 1);

    let collection = feature_collection(&report)?;
    let feature = &collection.features[0];
    assert_eq!(feature.properties["line_id"], 1);
    match &feature.geometry {
        Geometry::LineString { coordinates } => {
            assert_eq!(coordinates.len(), 50);
            assert!(coordinates.windows(2).all(|w| w[0][0] <= w[1][0]));
        }
        other => panic!("unexpected geometry {:?}", other),
    }
    assert!(feature.properties["length_m"].as_f64().unwrap() > 90.0);
    assert!(collection.properties["results"]["total_length_m"].as_f64().unwrap() > 90.0);
    Ok(())
}

#[test]
fn test_empty_report() -> Result<()> {
    let report = InstanceExtractor::new(ClassConfig::buildings())?.extract(&PointCloud::new(), BUILDINGS, "c")?;
    let collection = feature_collection(&report)?;
    assert!(collection.features.is_empty());
    assert_eq!(collection.properties["results"]["instances"], 0);
    assert!(collection.properties["results"]["stopped_early"].is_string());
    Ok(())
}
