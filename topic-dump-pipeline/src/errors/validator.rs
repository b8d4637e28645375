//! Error types for the request validator.
use thiserror::Error;

/// Rejected input. Validation fails on the first missing or malformed field
/// and has no side effects, so nothing needs cleaning up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid {field} '{value}': only letters, digits, '.', '-' and '_' are allowed")]
    InvalidIdentifier { field: &'static str, value: String },
}
