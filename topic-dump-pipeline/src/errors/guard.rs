//! Error types for the capacity guard.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapacityError {
    /// The working volume is too full to start a dump. The message text is
    /// part of the operator contract.
    #[error("Disk usage {used}% exceeds limit ({limit}%)")]
    OverThreshold { used: u8, limit: u8 },
    #[error("failed to stat volume {path}: {source}")]
    Statvfs {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },
}
