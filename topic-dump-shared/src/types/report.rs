use serde::{Deserialize, Serialize};

/// The single JSON object a run prints on stdout.
///
/// Exactly one report is emitted per invocation; everything else (tracing,
/// per-request log, audit log) goes elsewhere so callers can parse stdout
/// unconditionally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum RunReport {
    #[serde(rename = "OK")]
    Ok {
        artifactory_url: String,
        messages: u64,
        sha256: String,
    },
    #[serde(rename = "ERROR")]
    Error { message: String },
}

impl RunReport {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_report_shape() {
        let report = RunReport::Ok {
            artifactory_url: "https://store/kafka-dump/INC1/REQ1/orders/REQ1.tar.gz.enc"
                .to_string(),
            messages: 150,
            sha256: "ab".repeat(32),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"status\":\"OK\""));
        assert!(json.contains("\"messages\":150"));
        assert!(json.contains("\"sha256\""));
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_error_report_shape() {
        let report = RunReport::error("Disk usage 90% exceeds limit (85%)");
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(
            json,
            "{\"status\":\"ERROR\",\"message\":\"Disk usage 90% exceeds limit (85%)\"}"
        );
    }
}
