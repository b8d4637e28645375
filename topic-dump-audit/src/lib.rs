//! Audit and per-request logging for the topic dump pipeline.
//!
//! This crate provides:
//! - [`AuditSink`] trait for recording significant run events
//! - [`FileAuditLog`] append-only JSONL audit log shared by every run on the host
//! - [`MemoryAuditSink`] in-memory sink for testing
//! - [`RequestLog`] per-run operational log that lives inside the working
//!   directory
//!
//! The audit log is the durable record of outcomes: the working directory is
//! deleted at run end, the audit log is never rotated or deleted by this
//! component.

mod memory;
mod request_log;

pub use memory::MemoryAuditSink;
pub use request_log::RequestLog;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use topic_dump_shared::types::AuditRecord;

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AuditError>;

/// Port for recording append-only audit events.
///
/// Each call is an independent atomic line append; there is no in-memory
/// aggregation, so concurrent runs on the same host can share one log file.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Records one audit event.
    async fn record(&self, record: &AuditRecord) -> Result<()>;
}

#[async_trait]
impl<T: AuditSink + ?Sized> AuditSink for std::sync::Arc<T> {
    async fn record(&self, record: &AuditRecord) -> Result<()> {
        (**self).record(record).await
    }
}

/// Append-only audit log backed by a JSONL file.
///
/// One serialized [`AuditRecord`] per line. The file is created on first use
/// and only ever appended to.
pub struct FileAuditLog {
    path: PathBuf,
}

impl FileAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for FileAuditLog {
    async fn record(&self, record: &AuditRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        // Single write of one modest line; atomic under POSIX append semantics.
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}
