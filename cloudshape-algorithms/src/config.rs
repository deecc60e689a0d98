//! Per-class extraction parameters
//!
//! A [ClassConfig] holds every parameter of one extraction run. [ClassTable] maps class names (the
//! directory names of the classified point cloud files, e.g. `6_Buildings`) to their configuration and
//! ships with tuned defaults for the known classes.

use std::collections::BTreeMap;

use cloudshape_core::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

use crate::{footprint::ConcaveHullConfig, metrics::AspectMethod};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightFilterConfig {
    /// Points at or below this percentile of Z are removed
    pub percentile: f64,
    /// Fewer remaining points end the run without instances
    pub min_remaining_points: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierFilterConfig {
    pub k_neighbours: usize,
    /// Points with a mean neighbour distance above `mean + factor * std_dev` are removed
    pub std_dev_factor: f64,
    pub min_remaining_points: usize,
}

/// Coordinate space DBSCAN runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterSpace {
    /// XY projection
    Planar,
    /// Full XYZ coordinates
    Spatial,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusteringConfig {
    pub eps_m: f64,
    pub min_samples: usize,
    pub space: ClusterSpace,
}

/// Reference point of a footprint used by the overlap check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapReference {
    BboxCenter,
    VertexCentroid,
}

/// Order in which clusters are offered to the greedy overlap check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrder {
    /// Descending point count, ties broken by ascending label
    #[default]
    LargestFirst,
    /// Ascending DBSCAN label
    ByLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolygonConfig {
    pub min_points: usize,
    /// Clusters with fewer points per square meter of convex hull area are rejected before a footprint is built
    #[serde(default)]
    pub min_point_density: Option<f64>,
    pub min_area_m2: f64,
    pub max_area_m2: f64,
    pub max_aspect_ratio: f64,
    #[serde(default)]
    pub aspect_method: AspectMethod,
    pub min_overlap_distance_m: f64,
    pub overlap_reference: OverlapReference,
    #[serde(default)]
    pub candidate_order: CandidateOrder,
    pub concave_hull: ConcaveHullConfig,
}

/// Plausibility score of a centroid detection, used for masts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    pub min_relative_height_m: f64,
    pub max_relative_height_m: f64,
    /// Points per meter of relative height
    pub min_vertical_density: f64,
    pub max_vertical_density: f64,
    pub min_score: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_relative_height_m: 5.0,
            max_relative_height_m: 50.0,
            min_vertical_density: 10.0,
            max_vertical_density: 200.0,
            min_score: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CentroidConfig {
    pub min_points: usize,
    #[serde(default)]
    pub max_points: Option<usize>,
    #[serde(default)]
    pub quality: Option<QualityConfig>,
    /// Detections closer than this to a larger, already kept detection are dropped
    #[serde(default)]
    pub dedup_distance_m: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineConfig {
    pub min_points: usize,
    pub min_length_m: f64,
    pub min_aspect_ratio: f64,
    /// Widths below this value are clamped when computing the aspect ratio
    pub min_width_m: f64,
    pub max_vertices: usize,
}

/// Output geometry of a class together with its filter parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeometryConfig {
    Polygon(PolygonConfig),
    Centroid(CentroidConfig),
    Line(LineConfig),
}

impl GeometryConfig {
    /// Name of the output sub directory and file suffix
    pub fn collection_name(&self) -> &'static str {
        match self {
            GeometryConfig::Polygon(_) => "polygons",
            GeometryConfig::Centroid(_) => "centroids",
            GeometryConfig::Line(_) => "lines",
        }
    }
}

/// Complete parameter set of one extraction run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassConfig {
    /// Loading fewer points than this is a load error
    pub min_loaded_points: usize,
    #[serde(default)]
    pub voxel_size_m: Option<f64>,
    #[serde(default)]
    pub height_filter: Option<HeightFilterConfig>,
    #[serde(default)]
    pub outlier_filter: Option<OutlierFilterConfig>,
    pub clustering: ClusteringConfig,
    pub geometry: GeometryConfig,
}

fn check(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(PipelineError::Config(message.to_string()))
    }
}

impl ClassConfig {
    pub fn buildings() -> Self {
        Self {
            min_loaded_points: 50,
            voxel_size_m: Some(0.3),
            height_filter: Some(HeightFilterConfig {
                percentile: 20.0,
                min_remaining_points: 20,
            }),
            outlier_filter: Some(OutlierFilterConfig {
                k_neighbours: 10,
                std_dev_factor: 2.5,
                min_remaining_points: 100,
            }),
            clustering: ClusteringConfig {
                eps_m: 5.0,
                min_samples: 120,
                space: ClusterSpace::Planar,
            },
            geometry: GeometryConfig::Polygon(PolygonConfig {
                min_points: 80,
                min_point_density: Some(0.3),
                min_area_m2: 20.0,
                max_area_m2: 5000.0,
                max_aspect_ratio: 12.0,
                aspect_method: AspectMethod::EdgeRank,
                min_overlap_distance_m: 8.0,
                overlap_reference: OverlapReference::BboxCenter,
                candidate_order: CandidateOrder::LargestFirst,
                concave_hull: ConcaveHullConfig::default(),
            }),
        }
    }

    pub fn vegetation() -> Self {
        Self {
            min_loaded_points: 50,
            voxel_size_m: Some(0.4),
            height_filter: Some(HeightFilterConfig {
                percentile: 15.0,
                min_remaining_points: 20,
            }),
            outlier_filter: Some(OutlierFilterConfig {
                k_neighbours: 12,
                std_dev_factor: 2.5,
                min_remaining_points: 20,
            }),
            clustering: ClusteringConfig {
                eps_m: 5.0,
                min_samples: 50,
                space: ClusterSpace::Planar,
            },
            geometry: GeometryConfig::Polygon(PolygonConfig {
                min_points: 40,
                min_point_density: None,
                min_area_m2: 8.0,
                max_area_m2: 3000.0,
                max_aspect_ratio: 20.0,
                aspect_method: AspectMethod::BoundingBox,
                min_overlap_distance_m: 5.0,
                overlap_reference: OverlapReference::VertexCentroid,
                candidate_order: CandidateOrder::LargestFirst,
                concave_hull: ConcaveHullConfig {
                    alpha_m: 5.0,
                    max_boundary_neighbours: 10,
                    min_boundary_points: 6,
                    simplify_tolerance_m: 0.7,
                    min_ring_vertices: 6,
                },
            }),
        }
    }

    pub fn wires() -> Self {
        Self {
            min_loaded_points: 50,
            voxel_size_m: Some(0.2),
            height_filter: Some(HeightFilterConfig {
                percentile: 10.0,
                min_remaining_points: 10,
            }),
            outlier_filter: Some(OutlierFilterConfig {
                k_neighbours: 8,
                std_dev_factor: 2.5,
                min_remaining_points: 10,
            }),
            clustering: ClusteringConfig {
                eps_m: 5.0,
                min_samples: 30,
                space: ClusterSpace::Spatial,
            },
            geometry: GeometryConfig::Line(LineConfig {
                min_points: 20,
                min_length_m: 5.0,
                min_aspect_ratio: 3.0,
                min_width_m: 0.1,
                max_vertices: 50,
            }),
        }
    }

    pub fn masts() -> Self {
        Self {
            min_loaded_points: 30,
            voxel_size_m: None,
            height_filter: None,
            outlier_filter: None,
            clustering: ClusteringConfig {
                eps_m: 1.5,
                min_samples: 30,
                space: ClusterSpace::Planar,
            },
            geometry: GeometryConfig::Centroid(CentroidConfig {
                min_points: 100,
                max_points: Some(3000),
                quality: Some(QualityConfig::default()),
                dedup_distance_m: Some(1.5),
            }),
        }
    }

    pub fn trees() -> Self {
        Self {
            min_loaded_points: 20,
            voxel_size_m: None,
            height_filter: None,
            outlier_filter: None,
            clustering: ClusteringConfig {
                eps_m: 2.5,
                min_samples: 20,
                space: ClusterSpace::Planar,
            },
            geometry: GeometryConfig::Centroid(CentroidConfig {
                min_points: 20,
                max_points: None,
                quality: None,
                dedup_distance_m: None,
            }),
        }
    }

    /// Boundary polygons of connected road surfaces. Roads are ground level, so there is no height
    /// filter, and they are long, so neither the aspect ratio nor the overlap check applies
    pub fn roads() -> Self {
        Self::surface(1.0, 8.0, 50, 15.0, 50.0)
    }

    pub fn sidewalks() -> Self {
        Self::surface(1.0, 4.0, 30, 8.0, 10.0)
    }

    fn surface(voxel_size_m: f64, eps_m: f64, min_samples: usize, alpha_m: f64, min_area_m2: f64) -> Self {
        Self {
            min_loaded_points: 100,
            voxel_size_m: Some(voxel_size_m),
            height_filter: None,
            outlier_filter: None,
            clustering: ClusteringConfig {
                eps_m,
                min_samples,
                space: ClusterSpace::Planar,
            },
            geometry: GeometryConfig::Polygon(PolygonConfig {
                min_points: 20,
                min_point_density: None,
                min_area_m2,
                max_area_m2: 1.0e6,
                max_aspect_ratio: 1000.0,
                aspect_method: AspectMethod::BoundingBox,
                min_overlap_distance_m: 0.0,
                overlap_reference: OverlapReference::VertexCentroid,
                candidate_order: CandidateOrder::ByLabel,
                concave_hull: ConcaveHullConfig {
                    alpha_m,
                    max_boundary_neighbours: 10,
                    min_boundary_points: 4,
                    simplify_tolerance_m: 1.0,
                    min_ring_vertices: 4,
                },
            }),
        }
    }

    /// Road centerlines: the principal axis of every connected surface patch, clustered on all points
    pub fn road_centerlines() -> Self {
        Self::centerlines(3.0, 50, 20.0)
    }

    pub fn sidewalk_centerlines() -> Self {
        Self::centerlines(2.0, 30, 10.0)
    }

    fn centerlines(eps_m: f64, min_samples: usize, min_length_m: f64) -> Self {
        Self {
            min_loaded_points: 100,
            voxel_size_m: None,
            height_filter: None,
            outlier_filter: None,
            clustering: ClusteringConfig {
                eps_m,
                min_samples,
                space: ClusterSpace::Planar,
            },
            geometry: GeometryConfig::Line(LineConfig {
                min_points: min_samples,
                min_length_m,
                min_aspect_ratio: 3.0,
                min_width_m: 0.1,
                max_vertices: 50,
            }),
        }
    }

    /// Checks that all parameters are within their valid ranges
    pub fn validate(&self) -> Result<()> {
        if let Some(voxel_size) = self.voxel_size_m {
            check(voxel_size > 0.0, "voxel_size_m must be positive")?;
        }
        if let Some(height) = &self.height_filter {
            check(
                (0.0..=100.0).contains(&height.percentile),
                "height_filter.percentile must be within [0, 100]",
            )?;
        }
        if let Some(outlier) = &self.outlier_filter {
            check(outlier.k_neighbours > 0, "outlier_filter.k_neighbours must be positive")?;
            check(
                outlier.std_dev_factor >= 0.0,
                "outlier_filter.std_dev_factor must not be negative",
            )?;
        }
        check(self.clustering.eps_m > 0.0, "clustering.eps_m must be positive")?;
        check(
            self.clustering.min_samples > 0,
            "clustering.min_samples must be positive",
        )?;
        match &self.geometry {
            GeometryConfig::Polygon(polygon) => {
                check(
                    polygon.min_area_m2 <= polygon.max_area_m2,
                    "min_area_m2 must not exceed max_area_m2",
                )?;
                check(polygon.max_aspect_ratio > 0.0, "max_aspect_ratio must be positive")?;
                check(
                    polygon.min_overlap_distance_m >= 0.0,
                    "min_overlap_distance_m must not be negative",
                )?;
                check(
                    polygon.concave_hull.alpha_m > 0.0,
                    "concave_hull.alpha_m must be positive",
                )?;
            }
            GeometryConfig::Centroid(centroid) => {
                if let Some(max_points) = centroid.max_points {
                    check(
                        centroid.min_points <= max_points,
                        "min_points must not exceed max_points",
                    )?;
                }
            }
            GeometryConfig::Line(line) => {
                check(line.max_vertices >= 2, "a line needs at least 2 vertices")?;
                check(line.min_width_m > 0.0, "min_width_m must be positive")?;
            }
        }
        Ok(())
    }
}

/// Class configurations keyed by class name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ClassTable {
    classes: BTreeMap<String, ClassConfig>,
}

pub const ROADS: &str = "2_Roads";
pub const SIDEWALKS: &str = "3_Sidewalks";
pub const BUILDINGS: &str = "6_Buildings";
pub const TREES: &str = "7_Trees";
pub const VEGETATION: &str = "8_OtherVegetation";
pub const WIRES: &str = "11_Wires";
pub const MASTS: &str = "12_Masts";

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the tuned defaults of all known classes
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert(ROADS, ClassConfig::roads());
        table.insert(SIDEWALKS, ClassConfig::sidewalks());
        table.insert(BUILDINGS, ClassConfig::buildings());
        table.insert(TREES, ClassConfig::trees());
        table.insert(VEGETATION, ClassConfig::vegetation());
        table.insert(WIRES, ClassConfig::wires());
        table.insert(MASTS, ClassConfig::masts());
        table
    }

    pub fn insert<S: Into<String>>(&mut self, class: S, config: ClassConfig) -> Option<ClassConfig> {
        self.classes.insert(class.into(), config)
    }

    pub fn get(&self, class: &str) -> Option<&ClassConfig> {
        self.classes.get(class)
    }

    /// Looks up `class` and fails with a configuration error if it is unknown
    pub fn require(&self, class: &str) -> Result<&ClassConfig> {
        self.get(class).ok_or_else(|| {
            PipelineError::Config(format!(
                "no configuration for class '{}', known classes: {}",
                class,
                self.class_names().join(", ")
            ))
        })
    }

    pub fn class_names(&self) -> Vec<&str> {
        self.classes.keys().map(|k| k.as_str()).collect()
    }

    /// Replaces or adds all entries of `overrides`
    pub fn merge(&mut self, overrides: ClassTable) {
        self.classes.extend(overrides.classes);
    }

    pub fn validate(&self) -> Result<()> {
        for (class, config) in &self.classes {
            config
                .validate()
                .map_err(|e| PipelineError::Config(format!("class '{}': {}", class, e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_is_valid() {
        let table = ClassTable::builtin();
        assert_eq!(table.class_names().len(), 7);
        table.validate().unwrap();
        assert!(matches!(
            table.require(ROADS).unwrap().geometry,
            GeometryConfig::Polygon(_)
        ));
        assert!(matches!(
            table.require(WIRES).unwrap().geometry,
            GeometryConfig::Line(_)
        ));
        assert!(table.require("13_Roads").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let table = ClassTable::builtin();
        let serialized = toml::to_string(&table).unwrap();
        assert!(serialized.contains("kind = \"polygon\""));
        let parsed: ClassTable = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_parse_minimal_class() {
        let config: ClassConfig = toml::from_str(
            r#"
            min_loaded_points = 10

            [clustering]
            eps_m = 2.0
            min_samples = 5
            space = "planar"

            [geometry]
            kind = "centroid"
            min_points = 5
            "#,
        )
        .unwrap();
        assert!(config.voxel_size_m.is_none());
        assert!(config.height_filter.is_none());
        match config.geometry {
            GeometryConfig::Centroid(centroid) => {
                assert_eq!(centroid.min_points, 5);
                assert!(centroid.quality.is_none());
            }
            other => panic!("unexpected geometry {:?}", other),
        }
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_configs() {
        let mut config = ClassConfig::buildings();
        config.voxel_size_m = Some(0.0);
        assert!(config.validate().is_err());

        let mut config = ClassConfig::buildings();
        if let GeometryConfig::Polygon(polygon) = &mut config.geometry {
            polygon.min_area_m2 = 100.0;
            polygon.max_area_m2 = 10.0;
        }
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_surface_classes() {
        let roads = ClassConfig::roads();
        let sidewalks = ClassConfig::sidewalks();
        assert_eq!(roads.clustering.eps_m, 8.0);
        assert_eq!(sidewalks.clustering.min_samples, 30);
        assert!(roads.height_filter.is_none());
        match (roads.geometry, sidewalks.geometry) {
            (GeometryConfig::Polygon(road), GeometryConfig::Polygon(sidewalk)) => {
                assert_eq!(road.concave_hull.alpha_m, 15.0);
                assert_eq!(sidewalk.concave_hull.alpha_m, 8.0);
                assert_eq!(road.min_overlap_distance_m, 0.0);
            }
            other => panic!("unexpected geometries {:?}", other),
        }

        for (centerlines, min_length) in [
            (ClassConfig::road_centerlines(), 20.0),
            (ClassConfig::sidewalk_centerlines(), 10.0),
        ] {
            centerlines.validate().unwrap();
            assert!(matches!(
                centerlines.geometry,
                GeometryConfig::Line(line) if line.min_length_m == min_length
            ));
        }
    }

    #[test]
    fn test_merge_overrides_single_class() {
        let mut table = ClassTable::builtin();
        let mut overrides = ClassTable::new();
        let mut trees = ClassConfig::trees();
        trees.clustering.eps_m = 3.0;
        overrides.insert(TREES, trees);
        table.merge(overrides);
        assert_eq!(table.get(TREES).unwrap().clustering.eps_m, 3.0);
        assert_eq!(table.get(MASTS), Some(&ClassConfig::masts()));
    }
}
