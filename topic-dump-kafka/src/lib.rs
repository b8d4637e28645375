//! Shared Kafka utilities for the topic dump pipeline.
//!
//! This crate provides consumer configuration for full-topic captures and
//! the cluster/environment endpoint resolver.
//!
//! ## Usage
//!
//! ```ignore
//! use topic_dump_kafka::{create_consumer_with_config, ConsumerConfig};
//!
//! let config = ConsumerConfig::new("phy-prod-kafka:9093", "topic-dump-orders");
//! let consumer = create_consumer_with_config(&config)?;
//! ```

mod resolver;

pub use resolver::{KafkaEndpoint, ResolveEndpoint, ResolveError, StaticEndpointResolver};

use std::env;

use anyhow::Result;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::StreamConsumer;

/// Configuration for creating a capture consumer.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Kafka bootstrap address (e.g. "phy-prod-kafka:9093")
    pub bootstrap_servers: String,
    /// Consumer group id for this capture run
    pub group_id: String,
    /// SASL username (enables SASL/SSL if set)
    pub username: Option<String>,
    /// SASL password (required if username is set)
    pub password: Option<String>,
    /// Custom CA certificate in PEM format
    pub ssl_ca_pem: Option<String>,
}

impl ConsumerConfig {
    /// Create a new ConsumerConfig with the given bootstrap address and group id.
    pub fn new(bootstrap_servers: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            bootstrap_servers: bootstrap_servers.into(),
            group_id: group_id.into(),
            username: None,
            password: None,
            ssl_ca_pem: None,
        }
    }

    /// Create a ConsumerConfig from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `KAFKA_USERNAME` - SASL username (optional)
    /// - `KAFKA_PASSWORD` - SASL password (required if username is set)
    /// - `KAFKA_SSL_CA_PEM` - Custom CA cert in PEM format (optional)
    pub fn from_env(bootstrap_servers: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            bootstrap_servers: bootstrap_servers.into(),
            group_id: group_id.into(),
            username: env::var("KAFKA_USERNAME").ok(),
            password: env::var("KAFKA_PASSWORD").ok(),
            ssl_ca_pem: env::var("KAFKA_SSL_CA_PEM").ok(),
        }
    }

    /// Set SASL credentials.
    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }

    /// Set custom CA certificate.
    pub fn with_ssl_ca(mut self, ca_pem: String) -> Self {
        self.ssl_ca_pem = Some(ca_pem);
        self
    }
}

/// Create a Kafka stream consumer with the given configuration.
///
/// Configures the consumer for a full-topic capture:
/// - earliest offset reset, so the capture starts at the oldest retained message
/// - partition EOF events, so the capture knows when each partition is drained
/// - auto-commit disabled; a dump run never advances group offsets
/// - SASL/SSL authentication if credentials are provided
pub fn create_consumer_with_config(config: &ConsumerConfig) -> Result<StreamConsumer> {
    let mut client_config = ClientConfig::new();

    client_config
        .set("bootstrap.servers", &config.bootstrap_servers)
        .set("group.id", &config.group_id)
        .set("auto.offset.reset", "earliest")
        .set("enable.partition.eof", "true")
        .set("enable.auto.commit", "false")
        .set("session.timeout.ms", "10000");

    // If SASL credentials are provided, enable SASL/SSL (for managed Kafka)
    // Otherwise, use plaintext (for local development)
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        client_config
            .set("security.protocol", "SASL_SSL")
            .set("sasl.mechanisms", "PLAIN")
            .set("sasl.username", username)
            .set("sasl.password", password);

        // Use custom CA certificate if provided
        if let Some(ca_pem) = &config.ssl_ca_pem {
            client_config.set("ssl.ca.pem", ca_pem);
        }
    }

    Ok(client_config.create()?)
}

// Re-export commonly used rdkafka types for convenience
pub use rdkafka::consumer::{Consumer, StreamConsumer as CaptureConsumer};
pub use rdkafka::error::KafkaError;
pub use rdkafka::message::{Headers, Message};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumer_config_builders() {
        let config = ConsumerConfig::new("localhost:9092", "topic-dump-orders")
            .with_credentials("svc-dump".to_string(), "pw".to_string())
            .with_ssl_ca("-----BEGIN CERTIFICATE-----".to_string());

        assert_eq!(config.bootstrap_servers, "localhost:9092");
        assert_eq!(config.group_id, "topic-dump-orders");
        assert_eq!(config.username.as_deref(), Some("svc-dump"));
        assert!(config.ssl_ca_pem.is_some());
    }
}
