//! Error types for the archive-and-seal stage.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SealError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("metadata serialization failed: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
    #[error("encryption failed")]
    Encrypt,
    /// Decryption rejected the ciphertext: wrong passphrase or tampering.
    #[error("authentication failed: wrong passphrase or corrupted artifact")]
    AuthenticationFailed,
    #[error("sealed artifact is truncated or malformed")]
    MalformedArtifact,
    #[error("sealed artifact is empty")]
    EmptyArtifact,
}
