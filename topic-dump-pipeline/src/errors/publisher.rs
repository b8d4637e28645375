//! Error types for the artifact publisher.
use thiserror::Error;

/// Failure at the transport layer, before any HTTP status was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Anything other than 200 or 201, other 2xx codes included.
    #[error("artifact store returned status {status}")]
    UnexpectedStatus { status: u16 },
    #[error("failed to build http client: {0}")]
    Client(String),
}

impl PublishError {
    /// Transport failures and unexpected statuses are worth another attempt;
    /// a client that cannot even be built is not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::UnexpectedStatus { .. })
    }
}
