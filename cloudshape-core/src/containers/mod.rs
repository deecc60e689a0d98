//! In-memory point storage and spatial lookup structures
//!
//! [PointCloud] owns the positions of one (chunk, class) pair. [GridIndex] answers fixed-radius
//! neighbourhood queries over 2D or 3D coordinates and is shared by the clustering and footprint stages.

mod point_cloud;
pub use self::point_cloud::*;

mod grid_index;
pub use self::grid_index::*;
