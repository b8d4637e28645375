//! Mock extractor for testing without a broker.

use std::io::Write;
use std::path::Path;

use async_trait::async_trait;

use topic_dump_audit::RequestLog;
use topic_dump_kafka::KafkaEndpoint;
use topic_dump_shared::types::DumpRequest;

use crate::errors::ExtractionError;
use crate::extractor::{enforce_postconditions, ExtractMessages};

/// Extractor that writes scripted lines (or fails on demand) instead of
/// consuming from a broker. Applies the same postconditions as the real
/// extractor, so empty and oversized captures fail identically.
pub struct MockExtractor {
    lines: Vec<String>,
    fail_message: Option<String>,
    max_capture_bytes: u64,
}

impl MockExtractor {
    /// Capture exactly the given lines.
    pub fn with_lines(lines: Vec<String>) -> Self {
        Self {
            lines,
            fail_message: None,
            max_capture_bytes: u64::MAX,
        }
    }

    /// Capture `count` generated message lines.
    pub fn with_message_count(count: u64) -> Self {
        let lines = (0..count)
            .map(|offset| {
                format!(
                    "{{\"topic\":\"mock\",\"partition\":0,\"offset\":{offset},\"value\":\"m-{offset}\"}}"
                )
            })
            .collect();
        Self::with_lines(lines)
    }

    /// Always fail with a terminal extraction error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            lines: Vec::new(),
            fail_message: Some(message.into()),
            max_capture_bytes: u64::MAX,
        }
    }

    /// Lower the size ceiling the postcondition check enforces.
    pub fn with_size_ceiling(mut self, max_capture_bytes: u64) -> Self {
        self.max_capture_bytes = max_capture_bytes;
        self
    }
}

#[async_trait]
impl ExtractMessages for MockExtractor {
    async fn extract(
        &self,
        request: &DumpRequest,
        _endpoint: &KafkaEndpoint,
        capture_path: &Path,
        log: &RequestLog,
    ) -> Result<u64, ExtractionError> {
        if let Some(message) = &self.fail_message {
            log.append(&format!("mock extraction failure: {message}"));
            return Err(ExtractionError::Consume(message.clone()));
        }

        let mut file = std::fs::File::create(capture_path)?;
        for line in &self.lines {
            file.write_all(line.as_bytes())?;
            file.write_all(b"\n")?;
        }
        file.flush()?;

        enforce_postconditions(
            capture_path,
            &request.topic,
            self.lines.len() as u64,
            self.max_capture_bytes,
        )
    }
}
