//! GeoJSON output of extraction reports
//!
//! Coordinates are written unchanged in the projected CRS of the input point cloud.

mod model;
pub use self::model::*;

mod convert;
pub use self::convert::*;

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};

/// Writes `collection` as pretty-printed JSON to `path`, creating missing parent directories
pub fn write_feature_collection<P: AsRef<Path>>(collection: &FeatureCollection, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create output directory {}", parent.display()))?;
    }
    let mut writer = BufWriter::new(
        File::create(path).with_context(|| format!("Could not create {}", path.display()))?,
    );
    serde_json::to_writer_pretty(&mut writer, collection)
        .with_context(|| format!("Could not write GeoJSON to {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

pub fn read_feature_collection<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Could not open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Could not parse GeoJSON file {}", path.display()))
}
