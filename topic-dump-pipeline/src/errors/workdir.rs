//! Error types for the working directory guard.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkDirError {
    /// A leftover directory for the same (ticket, request-id, topic) key.
    /// Never auto-merged; the operator has to inspect and remove it.
    #[error("working directory already exists: {path}")]
    AlreadyExists { path: PathBuf },
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
