use std::env;
use std::path::PathBuf;

use topic_dump_audit::{AuditSink, FileAuditLog};
use topic_dump_kafka::{ResolveEndpoint, StaticEndpointResolver};
use topic_dump_pipeline::extractor::{ExtractMessages, KafkaExtractor};
use topic_dump_pipeline::orchestrator::Orchestrator;
use topic_dump_pipeline::publisher::{HttpPublisher, PublishArtifact};
use topic_dump_pipeline::sealer::{ArchiveSealer, SealArtifact};
use topic_dump_pipeline::settings::PipelineSettings;

use crate::errors::SetupError;

/// Default working volume; override with `DUMP_BASE_DIR`.
const DEFAULT_BASE_DIR: &str = "/var/tmp/topic-dump";

/// Shared append-only audit log, kept directly under the base dir so it
/// survives every per-run cleanup.
const AUDIT_LOG_FILE: &str = "audit.log";

/// `Dependencies` holds the wired production collaborators for one
/// pipeline run.
pub struct Dependencies {
    pub extractor: Box<dyn ExtractMessages>,
    pub sealer: Box<dyn SealArtifact>,
    pub publisher: Box<dyn PublishArtifact>,
    pub resolver: Box<dyn ResolveEndpoint>,
    pub audit: Box<dyn AuditSink>,
    pub settings: PipelineSettings,
    pub base_dir: PathBuf,
}

impl Dependencies {
    /// Creates a new `Dependencies` instance from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `DUMP_BASE_DIR` - working volume override (optional)
    /// - `KAFKA_BOOTSTRAP` - bootstrap address override, bypassing the
    ///   cluster/environment map (optional)
    /// - `KAFKA_USERNAME` / `KAFKA_PASSWORD` / `KAFKA_SSL_CA_PEM` - consumer
    ///   authentication, read when the extractor builds its consumer
    ///   (optional)
    pub fn new() -> Result<Self, SetupError> {
        let settings = PipelineSettings::default();
        let base_dir = env::var("DUMP_BASE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_BASE_DIR));

        let resolver = StaticEndpointResolver::from_env()
            .with_entry("PHY-PROD-CL1", "PROD", "phy-prod-kafka:9093")
            .with_entry("VM-UAT-CL2", "UAT", "vm-uat-kafka:9093");

        let publisher = HttpPublisher::from_settings(&settings)?;

        Ok(Self {
            extractor: Box::new(KafkaExtractor::new(&settings)),
            sealer: Box::new(ArchiveSealer::new()),
            publisher: Box::new(publisher),
            resolver: Box::new(resolver),
            audit: Box::new(FileAuditLog::new(base_dir.join(AUDIT_LOG_FILE))),
            settings,
            base_dir,
        })
    }

    /// Consumes the container into a ready-to-run orchestrator.
    pub fn into_orchestrator(self) -> Orchestrator {
        Orchestrator::new(
            self.extractor,
            self.sealer,
            self.publisher,
            self.resolver,
            self.audit,
            self.settings,
            self.base_dir,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_dependencies_default_base_dir() {
        unsafe {
            env::remove_var("DUMP_BASE_DIR");
        }
        let dependencies = Dependencies::new().unwrap();
        assert_eq!(dependencies.base_dir, PathBuf::from(DEFAULT_BASE_DIR));
    }

    #[test]
    #[serial]
    fn test_dependencies_base_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        unsafe {
            env::set_var("DUMP_BASE_DIR", dir.path());
        }
        let dependencies = Dependencies::new().unwrap();
        assert_eq!(dependencies.base_dir, dir.path());
        unsafe {
            env::remove_var("DUMP_BASE_DIR");
        }
    }

    #[test]
    #[serial]
    fn test_resolver_knows_builtin_clusters() {
        unsafe {
            env::remove_var("KAFKA_BOOTSTRAP");
        }
        let dependencies = Dependencies::new().unwrap();
        let endpoint = dependencies
            .resolver
            .resolve(Some("PHY-PROD-CL1"), Some("PROD"))
            .unwrap();
        assert_eq!(endpoint.bootstrap_servers, "phy-prod-kafka:9093");
        assert!(dependencies.resolver.resolve(None, None).is_err());
    }

    #[test]
    #[serial]
    fn test_resolver_bootstrap_override_wins() {
        unsafe {
            env::set_var("KAFKA_BOOTSTRAP", "localhost:9092");
        }
        let dependencies = Dependencies::new().unwrap();
        let endpoint = dependencies.resolver.resolve(None, None).unwrap();
        assert_eq!(endpoint.bootstrap_servers, "localhost:9092");
        unsafe {
            env::remove_var("KAFKA_BOOTSTRAP");
        }
    }
}
