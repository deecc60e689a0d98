use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use cloudshape_core::{
    containers::PointCloud,
    error::{self, PipelineError},
    nalgebra::Vector3,
};

use crate::base::PointCloudReader;

fn parse_coordinate(value: &str, name: char) -> Result<f64> {
    let coordinate: f64 = value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("ParseError expected {} coordinate found '{}'.", name, value))?;
    if !coordinate.is_finite() {
        bail!("ParseError {} coordinate '{}' is not finite.", name, value);
    }
    Ok(coordinate)
}

fn parse_line(line: &str, delimiter: char) -> Result<Vector3<f64>> {
    let mut fields = line.split(delimiter);
    let mut next = |name: char| -> Result<f64> {
        match fields.next() {
            Some(field) => parse_coordinate(field, name),
            None => bail!("Expected X, Y and Z values. Found End-of-Line."),
        }
    };
    Ok(Vector3::new(next('x')?, next('y')?, next('z')?))
}

/// Parses delimited X,Y,Z lines from `read`
///
/// The first line may be a header, which is detected by its first field not being a number. Empty lines
/// are skipped and additional columns after Z are ignored. Any other malformed line is an error.
pub fn parse_xyz<R: BufRead>(read: R, delimiter: char) -> Result<PointCloud> {
    let mut cloud = PointCloud::new();
    for (index, line) in read.lines().enumerate() {
        let line = line.with_context(|| format!("ReadError in line {}.", index + 1))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let is_header = index == 0
            && line
                .split(delimiter)
                .next()
                .map(|field| field.trim().parse::<f64>().is_err())
                .unwrap_or(false);
        if is_header {
            continue;
        }
        let position =
            parse_line(line, delimiter).with_context(|| format!("Malformed line {}.", index + 1))?;
        cloud.push(position);
    }
    Ok(cloud)
}

/// Reads all points of the XYZ file at `path`
pub fn read_xyz_file<P: AsRef<Path>>(path: P, delimiter: char) -> Result<PointCloud> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("Could not open XYZ file {}", path.as_ref().display()))?;
    parse_xyz(BufReader::new(file), delimiter)
}

/// `PointCloudReader` for already extracted, comma separated XYZ files
#[derive(Debug, Clone)]
pub struct XyzReader {
    delimiter: char,
}

impl XyzReader {
    pub fn new() -> Self {
        Self { delimiter: ',' }
    }

    pub fn with_delimiter(delimiter: char) -> Self {
        Self { delimiter }
    }
}

impl Default for XyzReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PointCloudReader for XyzReader {
    fn read(&self, path: &Path) -> error::Result<PointCloud> {
        if !path.is_file() {
            return Err(PipelineError::load(path, "file does not exist"));
        }
        read_xyz_file(path, self.delimiter).map_err(|e| PipelineError::load(path, format!("{:#}", e)))
    }

    fn extension(&self) -> &str {
        "csv"
    }
}
