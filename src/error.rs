use std::path::PathBuf;

use thiserror::Error;

/// Errors raised at the ingestion and I/O boundary.
///
/// Data-quality problems inside a dataset (missing images, non-numeric
/// cells, filters matching nothing) are never errors; they surface as
/// explicit values on the returned types instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV seems empty or unreadable")]
    EmptyDataset,
    #[error("no dataset given (expected a CSV file or a data.json)")]
    NoInput,
    #[error("CSV has no header row")]
    MissingHeaders,
    #[error("invalid view argument \"{0}\" (expected key=folder)")]
    InvalidView(String),
    #[error("unknown view \"{0}\"")]
    UnknownView(String),
    #[error("invalid condition \"{0}\" (expected e.g. \"mass<=12.5\")")]
    InvalidCondition(String),
    #[error("invalid brush \"{0}\" (expected e.g. \"mass=2:8;10:12\")")]
    InvalidBrush(String),
}

impl Error {
    pub(crate) fn io<P: Into<PathBuf>>(path: P, err: std::io::Error) -> Self {
        Error::Io(path.into(), err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
