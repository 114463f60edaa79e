use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading the raw booking export.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// The payload is valid JSON but not an array of container objects.
    #[error("malformed dataset at {location}: expected {expected}, found {found}")]
    Structural {
        location: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Failures while writing dashboard exports.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("no dataset loaded")]
    NoData,
    #[error(transparent)]
    Export(#[from] ExportError),
}
