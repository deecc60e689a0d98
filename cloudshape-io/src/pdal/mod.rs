//! Point extraction through the PDAL command line tool
//!
//! PDAL converts any supported point cloud file (LAS, LAZ, ...) into a headerless `X,Y,Z` text file,
//! which is then parsed with the XYZ reader. All intermediate files live in a temporary directory that
//! is removed when the read finishes, on success and on failure.

mod pipeline;
pub use self::pipeline::*;

mod pdal_reader;
pub use self::pdal_reader::*;
