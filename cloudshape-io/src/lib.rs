#![warn(clippy::all)]
//! I/O for the cloudshape extraction pipeline.
//!
//! Reading points goes through the [base::PointCloudReader] trait, which is implemented for plain XYZ
//! files ([ascii::XyzReader]) and for any point cloud format PDAL understands ([pdal::PdalReader]).
//! Results are written as GeoJSON feature collections.

pub mod ascii;
pub mod base;
pub mod geojson;
pub mod pdal;
// Input and output locations inside a chunk directory
pub mod paths;
// TOML settings file
pub mod settings;
