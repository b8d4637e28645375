//! This module defines the `Orchestrator` responsible for driving one dump
//! run through its stages in strict forward order: validating → guarding
//! capacity → extracting → sealing → publishing → done.
//!
//! Failure from any stage is terminal; there is no orchestrator-level retry
//! (each stage owns its own bounded retry budget). Stage results are plain
//! `Result` values, the first error wins, one FAILURE audit record carries
//! the reason, and the working directory is removed on every exit path by
//! its drop guard. The shared audit log is the only thing a run leaves
//! behind.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use topic_dump_audit::{AuditSink, RequestLog};
use topic_dump_kafka::ResolveEndpoint;
use topic_dump_shared::types::{
    AuditEventKind, AuditRecord, DumpMetadata, DumpRequest, RunReport,
};

use crate::errors::{PipelineError, SealError, WorkDirError};
use crate::extractor::ExtractMessages;
use crate::guard::CapacityGuard;
use crate::publisher::PublishArtifact;
use crate::sealer::{SealArtifact, SealPaths};
use crate::settings::PipelineSettings;
use crate::validator::{validate, RawRequest};
use crate::workdir::WorkDir;

/// Stages of one run, in execution order. Transitions only ever move
/// forward; a failure in any stage ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    GuardingCapacity,
    Extracting,
    Sealing,
    Publishing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::GuardingCapacity => "guarding capacity",
            Self::Extracting => "extracting",
            Self::Sealing => "sealing",
            Self::Publishing => "publishing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Everything a successful run reports back to the caller.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub artifact_url: String,
    pub messages: u64,
    pub sha256: String,
}

impl RunOutcome {
    /// The single JSON object printed on stdout for a successful run.
    pub fn report(&self) -> RunReport {
        RunReport::Ok {
            artifactory_url: self.artifact_url.clone(),
            messages: self.messages,
            sha256: self.sha256.clone(),
        }
    }
}

/// `Orchestrator` coordinates one dump run across its collaborators.
///
/// It holds each stage behind its trait, so the whole state machine runs
/// against fakes in tests exactly as it runs against Kafka, AES-GCM and the
/// artifact store in production.
pub struct Orchestrator {
    pub extractor: Box<dyn ExtractMessages>,
    pub sealer: Box<dyn SealArtifact>,
    pub publisher: Box<dyn PublishArtifact>,
    pub resolver: Box<dyn ResolveEndpoint>,
    pub audit: Box<dyn AuditSink>,
    pub settings: PipelineSettings,
    pub base_dir: PathBuf,
}

impl Orchestrator {
    /// Creates a new `Orchestrator` instance.
    pub fn new(
        extractor: Box<dyn ExtractMessages>,
        sealer: Box<dyn SealArtifact>,
        publisher: Box<dyn PublishArtifact>,
        resolver: Box<dyn ResolveEndpoint>,
        audit: Box<dyn AuditSink>,
        settings: PipelineSettings,
        base_dir: PathBuf,
    ) -> Self {
        Self {
            extractor,
            sealer,
            publisher,
            resolver,
            audit,
            settings,
            base_dir,
        }
    }

    /// Runs the pipeline once for the given raw request.
    ///
    /// On success exactly one SUCCESS audit record carries the artifact URL;
    /// on failure exactly one FAILURE record carries the reason. Either way
    /// the working directory is gone by the time this returns.
    pub async fn run(&self, raw: RawRequest) -> Result<RunOutcome, PipelineError> {
        let run_id = Uuid::new_v4().to_string();
        // Keep the raw identifiers around so a run rejected during
        // validation still gets an attributable FAILURE record.
        let fallback = raw.clone();

        let mut stage = Stage::Validating;
        match self.execute(raw, &run_id, &mut stage).await {
            Ok((request, outcome)) => {
                self.audit
                    .record(
                        &AuditRecord::new(
                            AuditEventKind::Success,
                            &request.ticket,
                            &request.request_id,
                            &request.topic,
                            &request.requestor,
                            &run_id,
                            format!("{} messages published", outcome.messages),
                        )
                        .with_artifact_url(&outcome.artifact_url),
                    )
                    .await?;
                info!(%run_id, url = %outcome.artifact_url, messages = outcome.messages, "dump complete");
                Ok(outcome)
            }
            Err(pipeline_error) => {
                error!(%run_id, %stage, error = %pipeline_error, "dump failed");
                let record = AuditRecord::new(
                    AuditEventKind::Failure,
                    fallback.ticket.unwrap_or_default(),
                    fallback.request_id.unwrap_or_default(),
                    fallback.topic.unwrap_or_default(),
                    fallback.requestor.unwrap_or_default(),
                    &run_id,
                    pipeline_error.to_string(),
                );
                if let Err(audit_error) = self.audit.record(&record).await {
                    error!(%audit_error, "failed to write FAILURE audit record");
                }
                Err(pipeline_error)
            }
        }
    }

    async fn execute(
        &self,
        raw: RawRequest,
        run_id: &str,
        stage: &mut Stage,
    ) -> Result<(DumpRequest, RunOutcome), PipelineError> {
        let (request, credentials) = validate(raw)?;

        *stage = Stage::GuardingCapacity;
        self.audit
            .record(&AuditRecord::new(
                AuditEventKind::Start,
                &request.ticket,
                &request.request_id,
                &request.topic,
                &request.requestor,
                run_id,
                "dump started",
            ))
            .await?;
        fs::create_dir_all(&self.base_dir).map_err(|source| WorkDirError::Io {
            path: self.base_dir.clone(),
            source,
        })?;
        let usage = CapacityGuard::new(self.settings.capacity_threshold_percent)
            .check(&self.base_dir)?;
        info!(used_percent = usage.used_percent, "capacity check passed");

        *stage = Stage::Extracting;
        let endpoint = self
            .resolver
            .resolve(request.cluster.as_deref(), request.environment.as_deref())?;
        let workdir = WorkDir::create(
            &self.base_dir,
            &request.ticket,
            &request.request_id,
            &request.topic,
        )?;
        let log = RequestLog::new(workdir.log_path());
        log.append(&format!(
            "run {run_id} started: topic '{}' from {} for {}",
            request.topic, endpoint.bootstrap_servers, request.requestor
        ));
        let capture_path = workdir.capture_path(&request.topic);
        let messages = self
            .extractor
            .extract(&request, &endpoint, &capture_path, &log)
            .await?;

        *stage = Stage::Sealing;
        let capture_bytes = fs::metadata(&capture_path).map_err(SealError::Io)?.len();
        let metadata = DumpMetadata {
            ticket: request.ticket.clone(),
            request_id: request.request_id.clone(),
            topic: request.topic.clone(),
            cluster: request.cluster.clone(),
            environment: request.environment.clone(),
            bootstrap_servers: endpoint.bootstrap_servers.clone(),
            message_count: messages,
            capture_bytes,
            run_id: run_id.to_string(),
            created_by: request.requestor.clone(),
            created_at: Utc::now(),
        };
        let paths = SealPaths::from_workdir(&workdir, &request);
        let artifact = self
            .sealer
            .seal(&paths, &metadata, &request.passphrase)
            .await?;

        *stage = Stage::Publishing;
        let artifact_url = self
            .publisher
            .publish(&artifact, &request, &credentials, &log)
            .await?;

        *stage = Stage::Done;
        log.append(&format!("artifact published to {artifact_url}"));
        drop(workdir);

        Ok((
            request,
            RunOutcome {
                artifact_url,
                messages,
                sha256: artifact.sha256,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use topic_dump_audit::MemoryAuditSink;
    use topic_dump_kafka::StaticEndpointResolver;

    use crate::errors::ValidationError;
    use crate::extractor::MockExtractor;
    use crate::publisher::MockPublisher;
    use crate::sealer::ArchiveSealer;

    fn raw_request() -> RawRequest {
        RawRequest {
            ticket: Some("INC1".to_string()),
            request_id: Some("REQ1".to_string()),
            topic: Some("orders".to_string()),
            passphrase: Some("x".to_string()),
            requestor: Some("ops.user".to_string()),
            cluster: None,
            environment: None,
            base_url: Some("https://store.example.com/artifactory".to_string()),
            username: Some("svc-dump".to_string()),
            secret: Some("pw".to_string()),
        }
    }

    fn orchestrator(
        extractor: MockExtractor,
        publisher: MockPublisher,
        audit: Arc<MemoryAuditSink>,
        base_dir: PathBuf,
    ) -> Orchestrator {
        let settings = PipelineSettings {
            // A test host's disk may legitimately sit above the operational
            // default.
            capacity_threshold_percent: 100,
            ..PipelineSettings::default()
        };
        Orchestrator::new(
            Box::new(extractor),
            Box::new(ArchiveSealer::new()),
            Box::new(publisher),
            Box::new(StaticEndpointResolver::new().with_override("localhost:9092")),
            Box::new(audit),
            settings,
            base_dir,
        )
    }

    #[tokio::test]
    async fn test_successful_run_reports_and_cleans_up() {
        let base = tempfile::tempdir().unwrap();
        let audit = Arc::new(MemoryAuditSink::new());
        let orchestrator = orchestrator(
            MockExtractor::with_message_count(150),
            MockPublisher::succeeding(),
            Arc::clone(&audit),
            base.path().to_path_buf(),
        );

        let outcome = orchestrator.run(raw_request()).await.unwrap();
        assert_eq!(outcome.messages, 150);
        assert_eq!(outcome.sha256.len(), 64);
        assert!(outcome
            .artifact_url
            .ends_with("/kafka-dump/INC1/REQ1/orders/REQ1.tar.gz.enc"));

        let json = serde_json::to_string(&outcome.report()).unwrap();
        assert!(json.contains("\"status\":\"OK\""));
        assert!(json.contains("\"messages\":150"));

        let records = audit.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event, AuditEventKind::Start);
        assert_eq!(records[1].event, AuditEventKind::Success);
        assert_eq!(records[1].run_id, records[0].run_id);
        assert!(records[1].artifact_url.is_some());

        // No working directory survives a successful run.
        assert!(!base.path().join("INC1").exists());
    }

    #[tokio::test]
    async fn test_validation_failure_is_audited_without_start() {
        let base = tempfile::tempdir().unwrap();
        let audit = Arc::new(MemoryAuditSink::new());
        let orchestrator = orchestrator(
            MockExtractor::with_message_count(1),
            MockPublisher::succeeding(),
            Arc::clone(&audit),
            base.path().to_path_buf(),
        );

        let raw = RawRequest {
            ticket: None,
            ..raw_request()
        };
        let error = orchestrator.run(raw).await.unwrap_err();
        assert!(error.is_validation());
        assert!(matches!(
            error,
            PipelineError::Validation(ValidationError::MissingField("ticket"))
        ));

        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event, AuditEventKind::Failure);
        assert_eq!(records[0].ticket, "");
        assert_eq!(records[0].topic, "orders");
    }

    #[tokio::test]
    async fn test_capacity_failure_happens_before_any_workdir() {
        let base = tempfile::tempdir().unwrap();
        let audit = Arc::new(MemoryAuditSink::new());
        let mut orchestrator = orchestrator(
            MockExtractor::with_message_count(1),
            MockPublisher::succeeding(),
            Arc::clone(&audit),
            base.path().to_path_buf(),
        );
        orchestrator.settings.capacity_threshold_percent = 0;

        let error = orchestrator.run(raw_request()).await.unwrap_err();
        assert!(matches!(error, PipelineError::Capacity(_)));
        assert!(error.to_string().contains("exceeds limit (0%)"));
        assert!(!error.is_validation());

        assert_eq!(audit.count_of(AuditEventKind::Failure), 1);
        assert!(!base.path().join("INC1").exists());
    }

    #[tokio::test]
    async fn test_extraction_failure_audits_once_and_never_publishes() {
        let base = tempfile::tempdir().unwrap();
        let holding = base.path().join("holding");
        let audit = Arc::new(MemoryAuditSink::new());
        let orchestrator = orchestrator(
            MockExtractor::failing("broker unreachable"),
            MockPublisher::capturing(holding.clone()),
            Arc::clone(&audit),
            base.path().join("runs"),
        );

        let error = orchestrator.run(raw_request()).await.unwrap_err();
        assert!(matches!(error, PipelineError::Extraction(_)));

        let records = audit.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].event, AuditEventKind::Failure);
        assert!(records[1].detail.contains("broker unreachable"));

        // Nothing reached the publisher and the working directory is gone.
        assert!(!holding.exists());
        assert!(!base.path().join("runs/INC1").exists());
    }

    #[tokio::test]
    async fn test_publish_failure_still_removes_workdir() {
        let base = tempfile::tempdir().unwrap();
        let audit = Arc::new(MemoryAuditSink::new());
        let orchestrator = orchestrator(
            MockExtractor::with_message_count(5),
            MockPublisher::failing("store offline"),
            Arc::clone(&audit),
            base.path().to_path_buf(),
        );

        let error = orchestrator.run(raw_request()).await.unwrap_err();
        assert!(matches!(error, PipelineError::Publish(_)));

        assert_eq!(audit.count_of(AuditEventKind::Failure), 1);
        assert_eq!(audit.count_of(AuditEventKind::Success), 0);
        assert!(!base.path().join("INC1").exists());
    }

    #[tokio::test]
    async fn test_leftover_workdir_fails_the_run() {
        let base = tempfile::tempdir().unwrap();
        let leftover = base.path().join("INC1/REQ1/orders");
        fs::create_dir_all(&leftover).unwrap();
        fs::write(leftover.join("orders.jsonl"), b"stale\n").unwrap();

        let audit = Arc::new(MemoryAuditSink::new());
        let orchestrator = orchestrator(
            MockExtractor::with_message_count(1),
            MockPublisher::succeeding(),
            Arc::clone(&audit),
            base.path().to_path_buf(),
        );

        let error = orchestrator.run(raw_request()).await.unwrap_err();
        assert!(matches!(
            error,
            PipelineError::WorkDir(WorkDirError::AlreadyExists { .. })
        ));

        // The leftover is never merged into or cleaned up; the operator has
        // to inspect it.
        assert!(leftover.join("orders.jsonl").exists());
    }

    #[tokio::test]
    async fn test_oversized_capture_never_reaches_sealing() {
        let base = tempfile::tempdir().unwrap();
        let audit = Arc::new(MemoryAuditSink::new());
        let orchestrator = orchestrator(
            MockExtractor::with_message_count(100).with_size_ceiling(64),
            MockPublisher::succeeding(),
            Arc::clone(&audit),
            base.path().to_path_buf(),
        );

        let error = orchestrator.run(raw_request()).await.unwrap_err();
        assert!(matches!(
            error,
            PipelineError::Extraction(crate::errors::ExtractionError::CaptureTooLarge { .. })
        ));
        assert!(!base.path().join("INC1").exists());
    }

    #[test]
    fn test_stage_order_is_forward_only() {
        let order = [
            Stage::Validating,
            Stage::GuardingCapacity,
            Stage::Extracting,
            Stage::Sealing,
            Stage::Publishing,
            Stage::Done,
        ];
        let names: Vec<String> = order.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            [
                "validating",
                "guarding capacity",
                "extracting",
                "sealing",
                "publishing",
                "done"
            ]
        );
    }
}
