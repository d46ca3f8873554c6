use std::path::PathBuf;

use thiserror::Error;

/// Fatal pipeline failures. Each variant names the file or column at fault.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required input path does not exist
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A JSON file could not be parsed, or has an unusable top-level shape
    #[error("cannot parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// The input CSV cannot be joined
    #[error("join column `{column}` not found in input CSV (available: {})", available.join(", "))]
    Schema { column: String, available: Vec<String> },

    /// An input CSV row has more fields than the header
    #[error("{}: line {line} has {found} fields, header has {expected}", path.display())]
    RowWidth {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io { path: path.into(), source }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        PipelineError::Csv { path: path.into(), source }
    }
}
