use anyhow::Result;
use cloudshape_algorithms::{
    config::GeometryConfig,
    instances::{Instance, InstanceGeometry},
    pipeline::ExtractionReport,
};
use serde_json::{json, Map, Value};

use super::{Feature, FeatureCollection, Geometry};

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn instance_feature(instance: &Instance, report: &ExtractionReport) -> Feature {
    match &instance.geometry {
        InstanceGeometry::Polygon {
            footprint,
            method,
            metrics,
        } => Feature::new(
            Geometry::Polygon {
                coordinates: vec![footprint.vertices().iter().map(|v| [v.x, v.y]).collect()],
            },
            into_map(json!({
                "polygon_id": instance.id,
                "class": report.class,
                "chunk": report.chunk,
                "area_m2": metrics.area_m2,
                "perimeter_m": metrics.perimeter_m,
                "point_count": instance.point_count,
                "point_density": metrics.point_density,
                "aspect_ratio": metrics.aspect_ratio,
                "compactness": metrics.compactness,
                "extraction_method": method,
            })),
        ),
        InstanceGeometry::Centroid {
            position,
            height_m,
            quality,
        } => {
            let mut properties = into_map(json!({
                "point_id": instance.id,
                "class": report.class,
                "chunk": report.chunk,
                "point_count": instance.point_count,
                "height_m": height_m,
                "extraction_method": report.extraction_method(),
            }));
            if let Some(quality) = quality {
                properties.insert("relative_height_m".into(), json!(quality.relative_height_m));
                properties.insert("point_density".into(), json!(quality.vertical_density));
                properties.insert("quality_score".into(), json!(quality.score));
            }
            Feature::new(
                Geometry::Point {
                    coordinates: vec![position.x, position.y, position.z],
                },
                properties,
            )
        }
        InstanceGeometry::Line { vertices, metrics } => Feature::new(
            Geometry::LineString {
                coordinates: vertices.iter().map(|v| [v.x, v.y]).collect(),
            },
            into_map(json!({
                "line_id": instance.id,
                "class": report.class,
                "chunk": report.chunk,
                "length_m": metrics.length_m,
                "width_m": metrics.width_m,
                "aspect_ratio": metrics.aspect_ratio,
                "point_count": instance.point_count,
                "min_height_m": metrics.min_height_m,
                "max_height_m": metrics.max_height_m,
                "avg_height_m": metrics.avg_height_m,
                "extraction_method": report.extraction_method(),
            })),
        ),
    }
}

fn average(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

fn results(report: &ExtractionReport) -> Value {
    let stages = &report.stages;
    let rejected: Map<String, Value> = report
        .rejections
        .iter()
        .map(|(reason, count)| (reason.as_str().to_string(), json!(count)))
        .collect();
    let mut results = into_map(json!({
        "input_points": stages.input_points,
        "voxel_filtered_points": stages.voxel_filtered_points,
        "height_filtered_points": stages.height_filtered_points,
        "clean_points": stages.clean_points,
        "clusters_found": stages.clusters_found,
        "noise_points": stages.noise_points,
        "instances": report.instances.len(),
        "rejected": rejected,
        "stopped_early": report.stopped_early,
    }));
    let count = report.instances.len();
    match report.config.geometry {
        GeometryConfig::Polygon(_) => {
            results.insert("total_area_m2".into(), json!(report.total_area_m2()));
            results.insert("avg_area_m2".into(), json!(average(report.total_area_m2(), count)));
        }
        GeometryConfig::Line(_) => {
            results.insert("total_length_m".into(), json!(report.total_length_m()));
            results.insert(
                "avg_length_m".into(),
                json!(average(report.total_length_m(), count)),
            );
        }
        GeometryConfig::Centroid(_) => {}
    }
    Value::Object(results)
}

/// Converts an extraction report into a feature collection named `<class>_<collection>`
///
/// The top-level properties hold the class, the chunk, the run parameters and the stage statistics of
/// the run.
pub fn feature_collection(report: &ExtractionReport) -> Result<FeatureCollection> {
    let properties = into_map(json!({
        "class": report.class,
        "chunk": report.chunk,
        "extraction_method": report.extraction_method(),
        "processing_time_seconds": report.processing_time.as_secs_f64(),
        "parameters": serde_json::to_value(report.config)?,
        "results": results(report),
    }));
    let features = report
        .instances
        .iter()
        .map(|instance| instance_feature(instance, report))
        .collect();
    Ok(FeatureCollection::new(
        format!("{}_{}", report.class, report.config.geometry.collection_name()),
        properties,
        features,
    ))
}
