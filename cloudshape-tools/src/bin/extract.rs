#![warn(clippy::all)]

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{App, Arg};
use cloudshape_io::{
    ascii::XyzReader, base::PointCloudReader, paths::ChunkLayout, pdal::PdalReader,
    settings::Settings,
};
use cloudshape_tools::extract_chunk;
use log::{info, warn};

struct Args {
    pub chunk: PathBuf,
    pub classes: Vec<String>,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub csv: bool,
}

fn get_args() -> Result<Args> {
    let matches = App::new("cloudshape extract")
        .version("0.1")
        .about("Extracts building footprints, vegetation areas, wire lines and mast/tree positions from a classified LiDAR chunk")
        .arg(
            Arg::with_name("CHUNK")
                .takes_value(true)
                .value_name("CHUNK")
                .help("Chunk directory, or its compressed/filtred_by_classes directory")
                .required(true),
        )
        .arg(
            Arg::with_name("CLASS")
                .short("c")
                .long("class")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .value_name("CLASS")
                .help("Class to extract, e.g. 6_Buildings. Can be given multiple times. Defaults to all configured classes present in the chunk"),
        )
        .arg(
            Arg::with_name("CONFIG")
                .long("config")
                .takes_value(true)
                .value_name("FILE")
                .help("TOML settings file with reader, output and per-class parameters"),
        )
        .arg(
            Arg::with_name("OUTPUT")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("DIR")
                .help("Base directory for the GeoJSON output. Defaults to the class directories of the chunk"),
        )
        .arg(
            Arg::with_name("CSV")
                .long("csv")
                .help("Read already extracted <class>/<class>.csv XYZ files instead of running PDAL"),
        )
        .get_matches();

    Ok(Args {
        chunk: matches.value_of("CHUNK").unwrap_or_default().into(),
        classes: matches
            .values_of("CLASS")
            .map(|values| values.map(String::from).collect())
            .unwrap_or_default(),
        config: matches.value_of("CONFIG").map(PathBuf::from),
        output: matches.value_of("OUTPUT").map(PathBuf::from),
        csv: matches.is_present("CSV"),
    })
}

fn main() -> Result<()> {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();

    let args = get_args()?;
    let settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    let table = settings.class_table();
    table.validate()?;

    let reader: Box<dyn PointCloudReader> = if args.csv {
        Box::new(XyzReader::new())
    } else {
        Box::new(PdalReader::new(&settings.reader))
    };

    let layout = ChunkLayout::resolve(&args.chunk)?;
    let classes = if args.classes.is_empty() {
        layout
            .available_classes(reader.extension())?
            .into_iter()
            .filter(|class| table.get(class).is_some())
            .collect()
    } else {
        args.classes.clone()
    };
    if classes.is_empty() {
        bail!(
            "No configured class found in {}, known classes: {}",
            layout.classes_dir().display(),
            table.class_names().join(", ")
        );
    }
    info!("Chunk {}: extracting {}", layout.chunk_name(), classes.join(", "));

    let output_base = args.output.as_deref().or(settings.output.directory.as_deref());
    let summary = extract_chunk(reader.as_ref(), &layout, &classes, &table, output_base);
    for run in &summary.runs {
        info!(
            "{}: {} instances, {} rejected",
            run.class,
            run.report.instances.len(),
            run.report.rejections.total()
        );
    }
    for (class, _) in &summary.failures {
        warn!("{}: failed", class);
    }
    info!(
        "Chunk {}: {} instances in total",
        layout.chunk_name(),
        summary.total_instances()
    );
    std::process::exit(summary.exit_code());
}
