#![warn(clippy::all)]

//! Core data structures for turning classified point clouds into simple geometries
//!
//! The central type is [PointCloud](crate::containers::PointCloud), an owned, ordered set of 3D positions
//! for one (chunk, class) pair. Every processing stage consumes a `PointCloud` and produces a new, smaller one.
//! Accepted polygon outputs are represented as closed [Footprint](crate::geometry::Footprint) rings.

pub extern crate nalgebra;

pub mod containers;
/// Error taxonomy shared by all pipeline stages
pub mod error;
/// Closed polygon rings and related 2D helpers
pub mod geometry;
/// Bounding volumes and small statistics helpers
pub mod math;
