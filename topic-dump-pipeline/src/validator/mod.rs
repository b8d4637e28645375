//! Request validation.
//!
//! Turns raw operator input into a [`DumpRequest`] plus [`StoreCredentials`],
//! or fails naming the first missing or malformed field. This stage never
//! touches disk or network.

use topic_dump_shared::types::{DumpRequest, Secret, StoreCredentials};

use crate::errors::ValidationError;

/// Unvalidated input as collected from CLI flags and environment variables.
/// `None` and empty strings are equally "missing".
#[derive(Debug, Default, Clone)]
pub struct RawRequest {
    pub ticket: Option<String>,
    pub request_id: Option<String>,
    pub topic: Option<String>,
    pub passphrase: Option<String>,
    pub requestor: Option<String>,
    pub cluster: Option<String>,
    pub environment: Option<String>,
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub secret: Option<String>,
}

/// Validates raw input into a request/credentials pair.
///
/// The ticket, request id and topic are used verbatim to build filesystem
/// paths and the upload URL, so they are restricted to a character class
/// that cannot traverse directories.
pub fn validate(raw: RawRequest) -> Result<(DumpRequest, StoreCredentials), ValidationError> {
    let ticket = require("ticket", raw.ticket)?;
    let request_id = require("request_id", raw.request_id)?;
    let topic = require("topic", raw.topic)?;
    let passphrase = require("passphrase", raw.passphrase)?;
    let base_url = require("base_url", raw.base_url)?;
    let username = require("username", raw.username)?;
    let secret = require("secret", raw.secret)?;
    let requestor = require("requestor", raw.requestor)?;

    require_safe_identifier("ticket", &ticket)?;
    require_safe_identifier("request_id", &request_id)?;
    require_safe_identifier("topic", &topic)?;

    let request = DumpRequest {
        ticket,
        request_id,
        topic,
        requestor,
        passphrase: Secret::new(passphrase),
        cluster: raw.cluster.filter(|c| !c.is_empty()),
        environment: raw.environment.filter(|e| !e.is_empty()),
    };
    let credentials = StoreCredentials {
        base_url: base_url.trim_end_matches('/').to_string(),
        username,
        secret: Secret::new(secret),
    };
    Ok((request, credentials))
}

fn require(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn require_safe_identifier(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if is_safe_identifier(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidIdentifier {
            field,
            value: value.to_string(),
        })
    }
}

/// Letters, digits, dot, dash and underscore only. Blocks `..`-style path
/// traversal and separator injection when the identifier becomes a path
/// component or URL segment.
fn is_safe_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}
