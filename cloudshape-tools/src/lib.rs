#![warn(clippy::all)]
//! Runs the extraction pipeline for the classes of one chunk and writes the results as GeoJSON.

use std::path::{Path, PathBuf};

use anyhow::Result;
use cloudshape_algorithms::{
    config::{ClassConfig, ClassTable},
    pipeline::{ExtractionReport, InstanceExtractor},
};
use cloudshape_core::error::PipelineError;
use cloudshape_io::{
    base::PointCloudReader,
    geojson::{feature_collection, write_feature_collection},
    paths::ChunkLayout,
};
use log::{error, info};

/// Result of one successful (chunk, class) run
#[derive(Debug)]
pub struct ClassRun {
    pub class: String,
    pub report: ExtractionReport,
    pub output_file: PathBuf,
}

/// Loads the points of `class`, extracts its instances and writes them to the output file of the class
///
/// Fails if the input can not be loaded, if fewer than `min_loaded_points` points were loaded, or if the
/// output can not be written. Running out of points inside the pipeline is not a failure.
pub fn run_extraction(
    reader: &dyn PointCloudReader,
    layout: &ChunkLayout,
    class: &str,
    config: &ClassConfig,
    output_base: Option<&Path>,
) -> Result<ClassRun> {
    let input = layout.input_file(class, reader.extension());
    info!("{}: loading {}", class, input.display());
    let cloud = reader.read(&input)?;
    if cloud.len() < config.min_loaded_points {
        return Err(PipelineError::load(
            &input,
            format!(
                "only {} points loaded, at least {} required",
                cloud.len(),
                config.min_loaded_points
            ),
        )
        .into());
    }

    let report = InstanceExtractor::new(*config)?.extract(&cloud, class, layout.chunk_name())?;
    let output_file = layout.output_file(class, config.geometry.collection_name(), output_base);
    write_feature_collection(&feature_collection(&report)?, &output_file)?;
    info!(
        "{}: wrote {} instances to {}",
        class,
        report.instances.len(),
        output_file.display()
    );
    Ok(ClassRun {
        class: class.to_string(),
        report,
        output_file,
    })
}

/// Outcome of all class runs of one chunk
#[derive(Debug, Default)]
pub struct ChunkSummary {
    pub runs: Vec<ClassRun>,
    pub failures: Vec<(String, anyhow::Error)>,
}

impl ChunkSummary {
    pub fn total_instances(&self) -> usize {
        self.runs.iter().map(|run| run.report.instances.len()).sum()
    }

    /// 0 if at least one instance was extracted, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.total_instances() > 0 {
            0
        } else {
            1
        }
    }
}

/// Runs every class in `classes` independently. A failing class is recorded and does not stop the others
pub fn extract_chunk(
    reader: &dyn PointCloudReader,
    layout: &ChunkLayout,
    classes: &[String],
    table: &ClassTable,
    output_base: Option<&Path>,
) -> ChunkSummary {
    let mut summary = ChunkSummary::default();
    for class in classes {
        let result = table
            .require(class)
            .map_err(anyhow::Error::from)
            .and_then(|config| run_extraction(reader, layout, class, config, output_base));
        match result {
            Ok(run) => summary.runs.push(run),
            Err(err) => {
                error!("{}: {:#}", class, err);
                summary.failures.push((class.clone(), err));
            }
        }
    }
    summary
}
