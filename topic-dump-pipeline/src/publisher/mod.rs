//! Artifact publication.
//!
//! PUTs the sealed artifact to the artifact store at
//! `<base>/<namespace>/<ticket>/<request-id>/<topic>/<filename>`, then
//! best-effort PUTs the digest file to the sibling path. Success is strict:
//! only HTTP 200 or 201 counts; any other status (other 2xx included) fails
//! the attempt. Credentials travel as an Authorization header, never in a
//! process argument list.

pub mod mock;

pub use mock::{MockPublisher, Script, ScriptedTransport};

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use topic_dump_audit::RequestLog;
use topic_dump_shared::types::{DumpRequest, StoreCredentials};

use crate::errors::{PublishError, TransportError};
use crate::retry::retry_transient;
use crate::sealer::SealedArtifact;
use crate::settings::PipelineSettings;

/// Status and (possibly truncated) body of one PUT attempt.
#[derive(Debug, Clone)]
pub struct PutResponse {
    pub status: u16,
    pub body: String,
}

/// Narrow transport seam under the publisher: one authenticated PUT of a
/// file to a URL. Production uses [`ReqwestTransport`]; tests script
/// responses with [`ScriptedTransport`].
#[async_trait]
pub trait PutTransport: Send + Sync {
    async fn put(
        &self,
        url: &str,
        credentials: &StoreCredentials,
        body: &Path,
    ) -> Result<PutResponse, TransportError>;
}

/// Production transport backed by reqwest with streaming upload bodies.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(connect_timeout: Duration, overall_timeout: Duration) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(overall_timeout)
            .build()
            .map_err(|e| PublishError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PutTransport for ReqwestTransport {
    async fn put(
        &self,
        url: &str,
        credentials: &StoreCredentials,
        body: &Path,
    ) -> Result<PutResponse, TransportError> {
        let file = tokio::fs::File::open(body).await?;
        let stream = ReaderStream::new(file);

        let response = self
            .client
            .put(url)
            .basic_auth(&credentials.username, Some(credentials.secret.expose()))
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(PutResponse { status, body })
    }
}

/// Trait for publishing a sealed artifact, returning its final URL.
#[async_trait]
pub trait PublishArtifact: Send + Sync {
    async fn publish(
        &self,
        artifact: &SealedArtifact,
        request: &DumpRequest,
        credentials: &StoreCredentials,
        log: &RequestLog,
    ) -> Result<String, PublishError>;
}

/// Production publisher: bounded retries over a [`PutTransport`].
pub struct HttpPublisher<T: PutTransport> {
    transport: T,
    namespace: String,
    attempts: usize,
    base_delay: Duration,
}

impl<T: PutTransport> HttpPublisher<T> {
    pub fn new(transport: T, settings: &PipelineSettings) -> Self {
        Self {
            transport,
            namespace: settings.namespace.clone(),
            attempts: settings.retry_attempts,
            base_delay: settings.retry_base_delay,
        }
    }

    async fn put_expecting_success(
        &self,
        label: &str,
        attempt: usize,
        url: &str,
        credentials: &StoreCredentials,
        body: &Path,
        log: &RequestLog,
    ) -> Result<(), PublishError> {
        match self.transport.put(url, credentials, body).await {
            Ok(response) => {
                log.append(&format!(
                    "{label} upload attempt {attempt}: status={} body={}",
                    response.status,
                    truncate(&response.body, 200)
                ));
                if is_success_status(response.status) {
                    Ok(())
                } else {
                    Err(PublishError::UnexpectedStatus {
                        status: response.status,
                    })
                }
            }
            Err(error) => {
                log.append(&format!("{label} upload attempt {attempt}: {error}"));
                Err(PublishError::Transport(error))
            }
        }
    }
}

impl HttpPublisher<ReqwestTransport> {
    /// Publisher wired with the default reqwest transport.
    pub fn from_settings(settings: &PipelineSettings) -> Result<Self, PublishError> {
        let transport =
            ReqwestTransport::new(settings.upload_connect_timeout, settings.upload_overall_timeout)?;
        Ok(Self::new(transport, settings))
    }
}

#[async_trait]
impl<T: PutTransport> PublishArtifact for HttpPublisher<T> {
    async fn publish(
        &self,
        artifact: &SealedArtifact,
        request: &DumpRequest,
        credentials: &StoreCredentials,
        log: &RequestLog,
    ) -> Result<String, PublishError> {
        let url = artifact_url(
            &credentials.base_url,
            &self.namespace,
            request,
            &file_name(&artifact.sealed_path),
        );

        let mut attempt = 0usize;
        retry_transient(
            self.attempts,
            self.base_delay,
            || {
                attempt += 1;
                self.put_expecting_success(
                    "artifact",
                    attempt,
                    &url,
                    credentials,
                    &artifact.sealed_path,
                    log,
                )
            },
            PublishError::is_transient,
        )
        .await?;

        info!(%url, bytes = artifact.bytes, "artifact published");

        // Digest upload is best-effort: the artifact is already durable and
        // its hash is in the audit trail, so a failed digest PUT only warns.
        let digest_url = artifact_url(
            &credentials.base_url,
            &self.namespace,
            request,
            &file_name(&artifact.digest_path),
        );
        if let Err(error) = self
            .put_expecting_success("digest", 1, &digest_url, credentials, &artifact.digest_path, log)
            .await
        {
            warn!(%digest_url, %error, "digest upload failed");
            log.append(&format!("warning: digest upload failed: {error}"));
        }

        Ok(url)
    }
}

/// Only 200 and 201 mean the store accepted the artifact.
pub(crate) fn is_success_status(status: u16) -> bool {
    matches!(status, 200 | 201)
}

/// Deterministic upload path for a run's artifact.
pub(crate) fn artifact_url(
    base_url: &str,
    namespace: &str,
    request: &DumpRequest,
    filename: &str,
) -> String {
    format!(
        "{}/{}/{}/{}/{}/{}",
        base_url.trim_end_matches('/'),
        namespace,
        request.ticket,
        request.request_id,
        request.topic,
        filename
    )
}

fn truncate(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
