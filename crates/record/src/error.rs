//! Save file error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing the save file
#[derive(Debug, Error)]
pub enum RecordError {
    /// Filesystem failure on the save file or its temporary sibling
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Save file content is not a valid record list
    #[error("Malformed save file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Type alias for record results
pub type Result<T> = std::result::Result<T, RecordError>;
