use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    Feature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureCollectionType {
    FeatureCollection,
}

/// The subset of GeoJSON geometries produced by the extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// `[x, y, z]`
    Point { coordinates: Vec<f64> },
    LineString { coordinates: Vec<[f64; 2]> },
    /// A single closed exterior ring
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    pub geometry: Geometry,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Map<String, Value>) -> Self {
        Self {
            kind: FeatureType::Feature,
            geometry,
            properties,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: FeatureCollectionType,
    pub name: String,
    pub properties: Map<String, Value>,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(name: String, properties: Map<String, Value>, features: Vec<Feature>) -> Self {
        Self {
            kind: FeatureCollectionType::FeatureCollection,
            name,
            properties,
            features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_geometry_json_layout() {
        let polygon = Geometry::Polygon {
            coordinates: vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
        };
        assert_eq!(
            serde_json::to_value(&polygon).unwrap(),
            json!({"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]})
        );
        let point = Geometry::Point {
            coordinates: vec![1.0, 2.0, 3.0],
        };
        assert_eq!(
            serde_json::to_value(&point).unwrap(),
            json!({"type": "Point", "coordinates": [1.0, 2.0, 3.0]})
        );
    }

    #[test]
    fn test_parse_feature() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [5.0, 1.0]]},
            "properties": {"line_id": 1}
        }))
        .unwrap();
        assert_eq!(feature.kind, FeatureType::Feature);
        assert_eq!(feature.properties["line_id"], 1);
        assert!(matches!(feature.geometry, Geometry::LineString { ref coordinates } if coordinates.len() == 2));
    }

    #[test]
    fn test_reject_wrong_type() {
        let result: Result<Feature, _> = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "geometry": {"type": "Point", "coordinates": [0.0, 0.0, 0.0]},
            "properties": {}
        }));
        assert!(result.is_err());
    }
}
