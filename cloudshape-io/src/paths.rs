use std::path::{Path, PathBuf};

use cloudshape_core::error::{PipelineError, Result};

const COMPRESSED_DIR: &str = "compressed";
const CLASSES_DIR: &str = "filtred_by_classes";

/// Directory layout of one chunk
///
/// Class inputs live at `<chunk>/compressed/filtred_by_classes/<class>/<class>.<ext>`. Outputs are
/// written to `<base>/<class>/<collection>/<class>_<collection>.geojson`, where `<base>` defaults to
/// the class directory of the chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkLayout {
    chunk_name: String,
    classes_dir: PathBuf,
}

impl ChunkLayout {
    /// Resolves either the chunk root or its `compressed/filtred_by_classes` directory
    pub fn resolve<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_classes_dir = path.file_name().map_or(false, |name| name == CLASSES_DIR)
            && path
                .parent()
                .and_then(Path::file_name)
                .map_or(false, |name| name == COMPRESSED_DIR);
        let (chunk_root, classes_dir) = if is_classes_dir {
            let root = path
                .parent()
                .and_then(Path::parent)
                .ok_or_else(|| PipelineError::load(path, "classes directory has no chunk root"))?;
            (root.to_path_buf(), path.to_path_buf())
        } else {
            (path.to_path_buf(), path.join(COMPRESSED_DIR).join(CLASSES_DIR))
        };
        if !classes_dir.is_dir() {
            return Err(PipelineError::load(&classes_dir, "not a directory"));
        }
        let chunk_name = chunk_root
            .canonicalize()?
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| PipelineError::load(&chunk_root, "cannot derive chunk name"))?;
        Ok(Self {
            chunk_name,
            classes_dir,
        })
    }

    pub fn chunk_name(&self) -> &str {
        &self.chunk_name
    }

    pub fn classes_dir(&self) -> &Path {
        &self.classes_dir
    }

    pub fn input_file(&self, class: &str, extension: &str) -> PathBuf {
        self.classes_dir
            .join(class)
            .join(format!("{}.{}", class, extension))
    }

    pub fn output_file(&self, class: &str, collection: &str, base: Option<&Path>) -> PathBuf {
        base.unwrap_or(self.classes_dir.as_path())
            .join(class)
            .join(collection)
            .join(format!("{}_{}.geojson", class, collection))
    }

    /// Names of all class directories of this chunk that contain an input file with `extension`, sorted
    pub fn available_classes(&self, extension: &str) -> Result<Vec<String>> {
        let mut classes = vec![];
        for entry in std::fs::read_dir(&self.classes_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let class = entry.file_name().to_string_lossy().into_owned();
            if self.input_file(&class, extension).is_file() {
                classes.push(class);
            }
        }
        classes.sort();
        Ok(classes)
    }
}
