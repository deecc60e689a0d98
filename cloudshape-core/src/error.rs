use std::path::PathBuf;

use thiserror::Error;

/// Error type of the extraction pipeline
///
/// Only `Load`, `Extraction`, `Config` and `Io` abort a run. `InsufficientData` signals a normal
/// "nothing to extract" outcome and `Geometry` only affects a single cluster.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to load points from {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Point extraction failed: {0}")]
    Extraction(String),

    #[error("Not enough points after {stage}: {remaining} remaining, {required} required")]
    InsufficientData {
        stage: &'static str,
        remaining: usize,
        required: usize,
    },

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Returns `true` if this error must abort the current extraction run
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            PipelineError::InsufficientData { .. } | PipelineError::Geometry(_)
        )
    }

    pub fn load<P: Into<PathBuf>, S: ToString>(path: P, reason: S) -> Self {
        PipelineError::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(PipelineError::load("a.laz", "missing").is_fatal());
        assert!(PipelineError::Extraction("exit status 1".into()).is_fatal());
        assert!(!PipelineError::Geometry("degenerate".into()).is_fatal());
        assert!(!PipelineError::InsufficientData {
            stage: "height filter",
            remaining: 3,
            required: 20
        }
        .is_fatal());
    }

    #[test]
    fn test_display() {
        let err = PipelineError::InsufficientData {
            stage: "outlier filter",
            remaining: 12,
            required: 100,
        };
        assert_eq!(
            err.to_string(),
            "Not enough points after outlier filter: 12 remaining, 100 required"
        );
    }
}
