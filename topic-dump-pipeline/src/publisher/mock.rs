//! Scripted transport and publisher mocks for testing.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use topic_dump_audit::RequestLog;
use topic_dump_shared::types::{DumpRequest, StoreCredentials};

use crate::errors::{PublishError, TransportError};
use crate::publisher::{artifact_url, PublishArtifact, PutResponse, PutTransport};
use crate::sealer::SealedArtifact;

/// One scripted transport outcome.
#[derive(Debug, Clone)]
pub enum Script {
    /// Respond with this HTTP status.
    Status(u16),
    /// Fail before any status is received.
    Error(String),
}

/// Transport that replays a scripted sequence of outcomes and records every
/// URL it was asked to PUT.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Script>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    pub fn with_script(script: Vec<Script>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_statuses(statuses: &[u16]) -> Self {
        Self::with_script(statuses.iter().copied().map(Script::Status).collect())
    }

    /// Handle to the URLs PUT so far, usable after the transport is moved
    /// into a publisher.
    pub fn requests_seen(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl PutTransport for ScriptedTransport {
    async fn put(
        &self,
        url: &str,
        _credentials: &StoreCredentials,
        _body: &Path,
    ) -> Result<PutResponse, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.script.lock().unwrap().pop_front() {
            Some(Script::Status(status)) => Ok(PutResponse {
                status,
                body: format!("scripted response {status}"),
            }),
            Some(Script::Error(message)) => Err(TransportError::Request(message)),
            None => Err(TransportError::Request(
                "scripted transport exhausted".to_string(),
            )),
        }
    }
}

/// Publisher mock for orchestrator tests.
///
/// On success it copies the sealed artifact and digest into a holding
/// directory, so tests can verify the published bytes after the working
/// directory is gone.
pub struct MockPublisher {
    holding_dir: Option<PathBuf>,
    fail_message: Option<String>,
    calls: AtomicUsize,
}

impl MockPublisher {
    pub fn succeeding() -> Self {
        Self {
            holding_dir: None,
            fail_message: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Succeed and keep a copy of everything that would have been uploaded.
    pub fn capturing(holding_dir: impl Into<PathBuf>) -> Self {
        Self {
            holding_dir: Some(holding_dir.into()),
            fail_message: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            holding_dir: None,
            fail_message: Some(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PublishArtifact for MockPublisher {
    async fn publish(
        &self,
        artifact: &SealedArtifact,
        request: &DumpRequest,
        credentials: &StoreCredentials,
        _log: &RequestLog,
    ) -> Result<String, PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.fail_message {
            return Err(PublishError::Transport(TransportError::Request(
                message.clone(),
            )));
        }

        if let Some(holding) = &self.holding_dir {
            std::fs::create_dir_all(holding)
                .map_err(|e| PublishError::Transport(TransportError::Io(e)))?;
            for source in [&artifact.sealed_path, &artifact.digest_path] {
                let target = holding.join(source.file_name().unwrap_or_default());
                std::fs::copy(source, target)
                    .map_err(|e| PublishError::Transport(TransportError::Io(e)))?;
            }
        }

        let filename = artifact
            .sealed_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(artifact_url(
            &credentials.base_url,
            "kafka-dump",
            request,
            &filename,
        ))
    }
}
