use crate::types::Secret;

/// A validated dump request. Immutable for the lifetime of one run.
///
/// Instances are only produced by the pipeline's request validator, so any
/// `DumpRequest` in circulation is known to carry non-empty identifiers drawn
/// from the path-safe character set.
#[derive(Clone, Debug)]
pub struct DumpRequest {
    /// Change ticket id (e.g. an INC/CHG number).
    pub ticket: String,
    /// Operator-facing request id, unique per dump.
    pub request_id: String,
    /// The Kafka topic to capture.
    pub topic: String,
    /// Identity of the operator who requested the dump.
    pub requestor: String,
    /// One-time passphrase used to seal this run's artifact. Not stored.
    pub passphrase: Secret,
    /// Optional cluster selector passed to the endpoint resolver.
    pub cluster: Option<String>,
    /// Optional environment selector passed to the endpoint resolver.
    pub environment: Option<String>,
}

/// Credentials for the remote artifact store.
#[derive(Clone, Debug)]
pub struct StoreCredentials {
    /// Base URL of the artifact store, without a trailing slash.
    pub base_url: String,
    pub username: String,
    pub secret: Secret,
}
