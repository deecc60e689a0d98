#![warn(clippy::all)]
//! Instance extraction from classified LiDAR point clouds.
//!
//! The crate contains the individual stages of the extraction pipeline (density reduction, ground
//! removal, outlier removal, clustering, footprint construction and validation) as well as the
//! [pipeline::InstanceExtractor] that chains them for one class configuration.

// Per-class parameters and the built-in class table
pub mod config;

// Voxel grid density reduction
pub mod voxel_grid;
// Percentile based ground removal
pub mod height_filter;
// Statistical outlier removal on mean kNN distances
pub mod outlier;
// DBSCAN clustering
pub mod segmentation;

// 2D convex hull (monotone chain)
pub mod convexhull;
// Douglas-Peucker simplification of polylines and rings
pub mod simplify;
// Footprint strategies: concave hull, convex hull and bounding box
pub mod footprint;
// Area, perimeter, aspect ratio, compactness and point density of footprints
pub mod metrics;

// Accepted instances, rejection reasons and the polygon filter
pub mod instances;
// Centroid detections with quality scoring and deduplication
pub mod centroid;
// Principal axis line fitting for wire-like clusters
pub mod line;

pub mod pipeline;
