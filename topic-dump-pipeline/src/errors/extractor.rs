//! Error types for the topic extractor.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to create consumer: {0}")]
    Consumer(String),
    #[error("consume failed: {0}")]
    Consume(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("capture serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Zero messages captured. Always a failure, never an empty success.
    #[error("topic '{topic}' produced an empty capture")]
    EmptyCapture { topic: String },
    /// The capture exceeded the configured ceiling. The partial file is
    /// discarded, not truncated.
    #[error("capture size {bytes} bytes exceeds ceiling of {limit} bytes")]
    CaptureTooLarge { bytes: u64, limit: u64 },
}

impl ExtractionError {
    /// Whether a fresh attempt could plausibly succeed. Postcondition
    /// violations are final; broker/consumer hiccups are retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Consumer(_) | Self::Consume(_) | Self::Io(_)
        )
    }
}
