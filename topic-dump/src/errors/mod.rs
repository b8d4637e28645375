//! Error types for the topic dump binary.
//! Setup failures happen before the pipeline runs; everything after wiring
//! is a `PipelineError` reported by the orchestrator itself.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("failed to set up publisher: {0}")]
    Publisher(#[from] topic_dump_pipeline::errors::PublishError),
}
