use std::path::Path;

use cloudshape_core::{containers::PointCloud, error::Result};

/// Base trait for all sources of point positions
///
/// Implementations return all points of the file at `path`. A missing or unreadable file is reported as
/// `PipelineError::Load`, a failing external tool as `PipelineError::Extraction`.
pub trait PointCloudReader {
    fn read(&self, path: &Path) -> Result<PointCloud>;

    /// File extension of the files this reader expects, used to locate class inputs
    fn extension(&self) -> &str;
}

impl<R: PointCloudReader + ?Sized> PointCloudReader for Box<R> {
    fn read(&self, path: &Path) -> Result<PointCloud> {
        (**self).read(path)
    }

    fn extension(&self) -> &str {
        (**self).extension()
    }
}
