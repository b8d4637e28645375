//! Tunables for one pipeline run.

use std::time::Duration;

/// Pipeline settings with operational defaults.
///
/// Every bound the stages enforce lives here so a deployment can tighten or
/// relax them in one place.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Abort before doing any work when the working volume is at or above
    /// this utilization.
    pub capacity_threshold_percent: u8,
    /// Hard ceiling on the capture file size; exceeding it fails the run.
    pub max_capture_bytes: u64,
    /// Attempts per retryable stage (extraction, artifact upload).
    pub retry_attempts: usize,
    /// Base delay for linear backoff between attempts.
    pub retry_base_delay: Duration,
    /// How long the extractor waits for the next message before treating the
    /// topic as drained.
    pub consume_idle_timeout: Duration,
    pub upload_connect_timeout: Duration,
    pub upload_overall_timeout: Duration,
    /// Path prefix under the artifact store base URL.
    pub namespace: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            capacity_threshold_percent: 85,
            max_capture_bytes: 5000 * 1024 * 1024,
            retry_attempts: 3,
            retry_base_delay: Duration::from_secs(2),
            consume_idle_timeout: Duration::from_secs(60),
            upload_connect_timeout: Duration::from_secs(30),
            upload_overall_timeout: Duration::from_secs(300),
            namespace: "kafka-dump".to_string(),
        }
    }
}
