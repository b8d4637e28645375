//! Per-request operational log.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::warn;

/// Timestamped line-oriented log for one run, stored inside the working
/// directory and deleted with it.
///
/// Holds the operational detail (retry attempts, HTTP statuses, consumer
/// diagnostics) that is too noisy for the shared audit log. Appends are
/// best-effort: a failed write must never fail the pipeline, so it is
/// reported through tracing instead.
pub struct RequestLog {
    path: PathBuf,
}

impl RequestLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one timestamped line.
    pub fn append(&self, message: &str) {
        let line = format!("[{}] {}\n", Utc::now().to_rfc3339(), message);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(error) = result {
            warn!(path = %self.path.display(), %error, "failed to append to request log");
        }
    }
}
