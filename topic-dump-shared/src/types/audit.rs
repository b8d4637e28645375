use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Significant events recorded in the shared audit log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditEventKind {
    Start,
    Failure,
    Success,
}

/// One append-only line in the shared audit log.
///
/// Records are keyed by (ticket, request_id, topic, requestor, run_id) and
/// are the durable trace of a run: the working directory is deleted at run
/// end, the audit log never is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub event: AuditEventKind,
    pub ticket: String,
    pub request_id: String,
    pub topic: String,
    pub requestor: String,
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    /// Human-readable outcome detail (failure reason, message count, ...).
    pub detail: String,
    /// Final artifact URL; only present on SUCCESS records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_url: Option<String>,
}

impl AuditRecord {
    pub fn new(
        event: AuditEventKind,
        ticket: impl Into<String>,
        request_id: impl Into<String>,
        topic: impl Into<String>,
        requestor: impl Into<String>,
        run_id: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            event,
            ticket: ticket.into(),
            request_id: request_id.into(),
            topic: topic.into(),
            requestor: requestor.into(),
            run_id: run_id.into(),
            timestamp: Utc::now(),
            detail: detail.into(),
            artifact_url: None,
        }
    }

    pub fn with_artifact_url(mut self, url: impl Into<String>) -> Self {
        self.artifact_url = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&AuditEventKind::Failure).unwrap(),
            "\"FAILURE\""
        );
        assert_eq!(
            serde_json::to_string(&AuditEventKind::Success).unwrap(),
            "\"SUCCESS\""
        );
    }

    #[test]
    fn test_success_record_carries_artifact_url() {
        let record = AuditRecord::new(
            AuditEventKind::Success,
            "INC1",
            "REQ1",
            "orders",
            "ops.user",
            "run-1",
            "150 messages",
        )
        .with_artifact_url("https://store/kafka-dump/INC1/REQ1/orders/REQ1.tar.gz.enc");

        let json = serde_json::to_string(&record).unwrap();
        let parsed: AuditRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
        assert!(json.contains("artifact_url"));
    }

    #[test]
    fn test_failure_record_omits_artifact_url() {
        let record = AuditRecord::new(
            AuditEventKind::Failure,
            "INC1",
            "REQ1",
            "orders",
            "ops.user",
            "run-1",
            "upload exhausted retries",
        );
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("artifact_url"));
    }
}
