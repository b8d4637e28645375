//! Topic extraction.
//!
//! Captures every message on a topic, from the earliest retained offset to
//! the current end of each partition, into a line-delimited file inside the
//! working directory. One JSON object per message: topic, partition, offset,
//! timestamp, key, headers, value.

pub mod mock;

pub use mock::MockExtractor;

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::consumer::Consumer;
use rdkafka::error::KafkaError;
use rdkafka::message::{Headers, Message};
use serde::Serialize;
use tracing::{debug, info};

use topic_dump_audit::RequestLog;
use topic_dump_kafka::{create_consumer_with_config, ConsumerConfig, KafkaEndpoint};
use topic_dump_shared::types::DumpRequest;

use crate::errors::ExtractionError;
use crate::retry::retry_transient;
use crate::settings::PipelineSettings;

/// One captured message as written to the capture file.
#[derive(Debug, Serialize)]
struct CaptureRecord<'a> {
    topic: &'a str,
    partition: i32,
    offset: i64,
    timestamp: Option<i64>,
    key: Option<String>,
    headers: Vec<CaptureHeader>,
    value: Option<String>,
}

#[derive(Debug, Serialize)]
struct CaptureHeader {
    key: String,
    value: Option<String>,
}

/// Trait for capturing a whole topic into a file.
///
/// Production code uses [`KafkaExtractor`]; tests use [`MockExtractor`].
#[async_trait]
pub trait ExtractMessages: Send + Sync {
    /// Captures every message of the request's topic from the resolved
    /// endpoint into `capture_path`, returning the message count.
    /// Implementations own their retry budget; a returned error is terminal.
    async fn extract(
        &self,
        request: &DumpRequest,
        endpoint: &KafkaEndpoint,
        capture_path: &Path,
        log: &RequestLog,
    ) -> Result<u64, ExtractionError>;
}

/// Production extractor backed by an rdkafka stream consumer.
///
/// The consumer is built per run from the resolved endpoint; SASL/SSL
/// credentials, if the cluster needs them, come from the environment (see
/// [`ConsumerConfig::from_env`]).
pub struct KafkaExtractor {
    attempts: usize,
    base_delay: Duration,
    idle_timeout: Duration,
    max_capture_bytes: u64,
}

impl KafkaExtractor {
    pub fn new(settings: &PipelineSettings) -> Self {
        Self {
            attempts: settings.retry_attempts,
            base_delay: settings.retry_base_delay,
            idle_timeout: settings.consume_idle_timeout,
            max_capture_bytes: settings.max_capture_bytes,
        }
    }

    /// One full consume attempt. Always starts from a fresh capture file so
    /// a retried attempt cannot leave duplicated lines behind.
    async fn consume_once(
        &self,
        topic: &str,
        endpoint: &KafkaEndpoint,
        capture_path: &Path,
        log: &RequestLog,
    ) -> Result<u64, ExtractionError> {
        let config = ConsumerConfig::from_env(
            endpoint.bootstrap_servers.clone(),
            format!("topic-dump-{topic}"),
        );
        let consumer = create_consumer_with_config(&config)
            .map_err(|e| ExtractionError::Consumer(e.to_string()))?;

        let metadata = consumer
            .fetch_metadata(Some(topic), Duration::from_secs(10))
            .map_err(|e| ExtractionError::Consume(e.to_string()))?;
        let partitions = metadata
            .topics()
            .iter()
            .find(|t| t.name() == topic)
            .map(|t| t.partitions().len())
            .unwrap_or(0);
        if partitions == 0 {
            return Err(ExtractionError::Consume(format!(
                "topic '{topic}' has no partitions"
            )));
        }

        consumer
            .subscribe(&[topic])
            .map_err(|e| ExtractionError::Consume(e.to_string()))?;

        let mut writer = BufWriter::new(File::create(capture_path)?);
        let mut drained: HashSet<i32> = HashSet::new();
        let mut count: u64 = 0;

        loop {
            let received = tokio::time::timeout(self.idle_timeout, consumer.recv()).await;
            match received {
                // No traffic for the idle window: the broker has nothing
                // more to hand us. Partition EOF normally ends the loop
                // first; this is the backstop for quiet brokers.
                Err(_elapsed) => {
                    log.append(&format!(
                        "consume idle for {}s with {count} messages captured, stopping",
                        self.idle_timeout.as_secs()
                    ));
                    break;
                }
                Ok(Err(KafkaError::PartitionEOF(partition))) => {
                    debug!(topic, partition, "partition drained");
                    drained.insert(partition);
                    if drained.len() >= partitions {
                        break;
                    }
                }
                Ok(Err(error)) => {
                    log.append(&format!("consume error: {error}"));
                    return Err(ExtractionError::Consume(error.to_string()));
                }
                Ok(Ok(message)) => {
                    let record = CaptureRecord {
                        topic: message.topic(),
                        partition: message.partition(),
                        offset: message.offset(),
                        timestamp: message.timestamp().to_millis(),
                        key: message
                            .key()
                            .map(|k| String::from_utf8_lossy(k).into_owned()),
                        headers: message
                            .headers()
                            .map(|headers| {
                                headers
                                    .iter()
                                    .map(|h| CaptureHeader {
                                        key: h.key.to_string(),
                                        value: h
                                            .value
                                            .map(|v| String::from_utf8_lossy(v).into_owned()),
                                    })
                                    .collect()
                            })
                            .unwrap_or_default(),
                        value: message
                            .payload()
                            .map(|v| String::from_utf8_lossy(v).into_owned()),
                    };
                    serde_json::to_writer(&mut writer, &record)?;
                    writer.write_all(b"\n")?;
                    count += 1;
                }
            }
        }

        writer.flush()?;
        info!(topic, messages = count, "capture complete");
        Ok(count)
    }
}

#[async_trait]
impl ExtractMessages for KafkaExtractor {
    async fn extract(
        &self,
        request: &DumpRequest,
        endpoint: &KafkaEndpoint,
        capture_path: &Path,
        log: &RequestLog,
    ) -> Result<u64, ExtractionError> {
        let topic = request.topic.as_str();
        let mut attempt = 0usize;
        let count = retry_transient(
            self.attempts,
            self.base_delay,
            || {
                attempt += 1;
                log.append(&format!("extraction attempt {attempt} for topic '{topic}'"));
                self.consume_once(topic, endpoint, capture_path, log)
            },
            ExtractionError::is_transient,
        )
        .await?;

        enforce_postconditions(capture_path, topic, count, self.max_capture_bytes)
    }
}

/// Postconditions on a successful capture. Never retried: an empty topic
/// stays empty and an oversized capture stays oversized.
pub(crate) fn enforce_postconditions(
    capture_path: &Path,
    topic: &str,
    count: u64,
    max_capture_bytes: u64,
) -> Result<u64, ExtractionError> {
    let bytes = std::fs::metadata(capture_path)?.len();

    if count == 0 || bytes == 0 {
        let _ = std::fs::remove_file(capture_path);
        return Err(ExtractionError::EmptyCapture {
            topic: topic.to_string(),
        });
    }
    if bytes > max_capture_bytes {
        // Discard, never truncate: a partial capture silently missing the
        // tail would look complete to the recipient.
        let _ = std::fs::remove_file(capture_path);
        return Err(ExtractionError::CaptureTooLarge {
            bytes,
            limit: max_capture_bytes,
        });
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postconditions_accept_regular_capture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.jsonl");
        std::fs::write(&path, b"{\"offset\":0}\n{\"offset\":1}\n").unwrap();

        let count = enforce_postconditions(&path, "orders", 2, 1024).unwrap();
        assert_eq!(count, 2);
        assert!(path.exists());
    }

    #[test]
    fn test_postconditions_reject_zero_messages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.jsonl");
        std::fs::write(&path, b"").unwrap();

        let result = enforce_postconditions(&path, "orders", 0, 1024);
        assert!(matches!(result, Err(ExtractionError::EmptyCapture { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_postconditions_discard_oversized_capture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.jsonl");
        std::fs::write(&path, vec![b'x'; 2048]).unwrap();

        let result = enforce_postconditions(&path, "orders", 10, 1024);
        match result {
            Err(ExtractionError::CaptureTooLarge { bytes, limit }) => {
                assert_eq!(bytes, 2048);
                assert_eq!(limit, 1024);
            }
            other => panic!("expected CaptureTooLarge, got {other:?}"),
        }
        // Hard failure discards the partial file.
        assert!(!path.exists());
    }

    #[test]
    fn test_oversize_is_not_transient() {
        assert!(!ExtractionError::CaptureTooLarge {
            bytes: 2,
            limit: 1
        }
        .is_transient());
        assert!(!ExtractionError::EmptyCapture {
            topic: "orders".to_string()
        }
        .is_transient());
        assert!(ExtractionError::Consume("broker down".to_string()).is_transient());
    }
}
