//! Error types for the pipeline orchestrator.
use thiserror::Error;

use topic_dump_audit::AuditError;
use topic_dump_kafka::ResolveError;

use crate::errors::{
    CapacityError, ExtractionError, PublishError, SealError, ValidationError, WorkDirError,
};

/// Terminal failure of a run. Every stage error is terminal at this level;
/// stages do their own bounded retries internally.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error(transparent)]
    WorkDir(#[from] WorkDirError),
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("sealing failed: {0}")]
    Seal(#[from] SealError),
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
    #[error("endpoint resolution failed: {0}")]
    Resolve(#[from] ResolveError),
    #[error("audit log write failed: {0}")]
    Audit(#[from] AuditError),
}

impl PipelineError {
    /// Bad input rather than a runtime fault; callers map this to a distinct
    /// exit code.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
