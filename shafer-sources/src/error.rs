//! Evidence-loading error types.
//!
//! Every failure mode has a named variant. Parse errors carry the location
//! that failed; evidence errors carry the name of the offending source.

use std::path::PathBuf;

use shafer_core::ShaferError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to open '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error at line {line}: {source}")]
    Csv {
        line: usize,
        #[source]
        source: csv::Error,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Evidence session contains no sources")]
    EmptySession,

    #[error("Invalid frame: {0}")]
    Frame(#[source] ShaferError),

    #[error("Invalid evidence from source '{name}': {source}")]
    Evidence {
        name: String,
        #[source]
        source: ShaferError,
    },
}

/// Result type alias for evidence loading.
pub type SourceResult<T> = Result<T, SourceError>;
