//! Settings file of the extraction tools
//!
//! ```toml
//! [reader]
//! command = "pdal"
//! args = ["pipeline"]
//! timeout_secs = 300
//!
//! [output]
//! directory = "/data/instances"
//!
//! [classes.6_Buildings]
//! min_loaded_points = 50
//! # ... a complete class configuration, replacing the built-in one
//! ```

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use cloudshape_algorithms::config::ClassTable;
use serde::{Deserialize, Serialize};

/// How the external point extraction tool is invoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    pub command: String,
    /// Arguments passed before the pipeline file
    pub args: Vec<String>,
    pub timeout_secs: u64,
    /// Parent directory for temporary files, the system default if unset
    pub temp_dir: Option<PathBuf>,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            command: "pdal".to_string(),
            args: vec!["pipeline".to_string()],
            timeout_secs: 300,
            temp_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Base directory for GeoJSON output. Defaults to the class directory of the chunk
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reader: ReaderSettings,
    pub output: OutputSettings,
    /// Class configurations replacing the built-in ones
    pub classes: ClassTable,
}

impl Settings {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(contents).context("Invalid settings")?;
        settings.classes.validate()?;
        Ok(settings)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Could not read settings file {}", path.as_ref().display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Could not load settings file {}", path.as_ref().display()))
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)
            .with_context(|| format!("Could not write settings file {}", path.as_ref().display()))
    }

    /// Built-in class table with the classes of this settings file applied on top
    pub fn class_table(&self) -> ClassTable {
        let mut table = ClassTable::builtin();
        table.merge(self.classes.clone());
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudshape_algorithms::config::{
        ClassConfig, GeometryConfig, BUILDINGS, MASTS, ROADS, SIDEWALKS, TREES,
    };
    use cloudshape_core::error::PipelineError;

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.reader.command, "pdal");
        assert_eq!(settings.reader.timeout_secs, 300);
        assert_eq!(settings.class_table(), ClassTable::builtin());
    }

    #[test]
    fn test_partial_reader_section() {
        let settings = Settings::from_toml_str(
            r#"
            [reader]
            command = "/opt/pdal/bin/pdal"
            timeout_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(settings.reader.command, "/opt/pdal/bin/pdal");
        assert_eq!(settings.reader.args, vec!["pipeline".to_string()]);
        assert_eq!(settings.reader.timeout_secs, 60);
    }

    #[test]
    fn test_class_override() {
        let settings = Settings::from_toml_str(
            r#"
            [output]
            directory = "/tmp/instances"

            [classes.7_Trees]
            min_loaded_points = 10

            [classes.7_Trees.clustering]
            eps_m = 3.0
            min_samples = 15
            space = "planar"

            [classes.7_Trees.geometry]
            kind = "centroid"
            min_points = 15
            "#,
        )
        .unwrap();
        assert_eq!(settings.output.directory, Some(PathBuf::from("/tmp/instances")));
        let table = settings.class_table();
        let trees = table.get(TREES).unwrap();
        assert_eq!(trees.clustering.eps_m, 3.0);
        assert!(matches!(trees.geometry, GeometryConfig::Centroid(c) if c.min_points == 15));
        assert_eq!(table.get(MASTS), Some(&ClassConfig::masts()));
    }

    #[test]
    fn test_roads_switch_to_centerlines() {
        let mut settings = Settings::default();
        settings.classes.insert(ROADS, ClassConfig::road_centerlines());
        let serialized = toml::to_string_pretty(&settings).unwrap();
        assert!(serialized.contains("kind = \"line\""));

        let table = Settings::from_toml_str(&serialized).unwrap().class_table();
        assert_eq!(table.get(ROADS), Some(&ClassConfig::road_centerlines()));
        assert!(matches!(table.get(ROADS).unwrap().geometry, GeometryConfig::Line(_)));
        assert_eq!(table.get(SIDEWALKS), Some(&ClassConfig::sidewalks()));
    }

    #[test]
    fn test_invalid_class_is_rejected() {
        let mut settings = Settings::default();
        let mut buildings = ClassConfig::buildings();
        buildings.clustering.eps_m = -1.0;
        settings.classes.insert(BUILDINGS, buildings);
        let serialized = toml::to_string_pretty(&settings).unwrap();
        let err = Settings::from_toml_str(&serialized).unwrap_err();
        assert!(err.downcast_ref::<PipelineError>().is_some());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloudshape.toml");
        let mut settings = Settings::default();
        settings.reader.timeout_secs = 42;
        settings.classes.insert(TREES, ClassConfig::trees());
        settings.to_file(&path).unwrap();
        assert_eq!(Settings::from_file(&path).unwrap(), settings);
        assert!(Settings::from_file(dir.path().join("missing.toml")).is_err());
    }
}
