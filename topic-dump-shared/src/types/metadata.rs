use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The generated metadata record sealed into every artifact alongside the
/// capture file.
///
/// The record travels with the payload (inside the archive, before
/// encryption) and is duplicated into the audit trail, so a recipient can
/// verify what they decrypted without consulting the host that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DumpMetadata {
    pub ticket: String,
    pub request_id: String,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Bootstrap address the capture was consumed from.
    pub bootstrap_servers: String,
    /// Number of messages captured.
    pub message_count: u64,
    /// Size of the capture file in bytes (measured before sealing).
    pub capture_bytes: u64,
    /// Unique id of this run; also keyed into the audit log.
    pub run_id: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_round_trips_through_json() {
        let metadata = DumpMetadata {
            ticket: "INC1".to_string(),
            request_id: "REQ1".to_string(),
            topic: "orders".to_string(),
            cluster: Some("PHY-PROD-CL1".to_string()),
            environment: Some("PROD".to_string()),
            bootstrap_servers: "phy-prod-kafka:9093".to_string(),
            message_count: 150,
            capture_bytes: 4096,
            run_id: "b2c3".to_string(),
            created_by: "ops.user".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&metadata).unwrap();
        let parsed: DumpMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn test_metadata_omits_absent_selectors() {
        let metadata = DumpMetadata {
            ticket: "INC1".to_string(),
            request_id: "REQ1".to_string(),
            topic: "orders".to_string(),
            cluster: None,
            environment: None,
            bootstrap_servers: "localhost:9092".to_string(),
            message_count: 0,
            capture_bytes: 0,
            run_id: "r".to_string(),
            created_by: "ops".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&metadata).unwrap();
        assert!(!json.contains("cluster"));
        assert!(!json.contains("environment"));
    }
}
