//! Error types for runner connections

use thiserror::Error;

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Error types for runner connections
///
/// Only `TransportUnavailable`, `ShutDown` and `Config` ever reach the caller
/// of [`RunnerConnection`](crate::RunnerConnection). Connection and handshake
/// failures are absorbed by the reconnect loop.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunnerError {
    /// No usable transport could be resolved
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    /// Opening, reading or writing the connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailure(String),

    /// The management plane rejected the handshake
    #[error("Handshake rejected: {0}")]
    HandshakeRejected(String),

    /// The connection manager was shut down
    #[error("Runner connection is shut down")]
    ShutDown,

    /// Invalid or unreadable configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RunnerError {
    /// Build a `ConnectionFailure` from any displayable error
    pub fn connection(err: impl std::fmt::Display) -> Self {
        RunnerError::ConnectionFailure(err.to_string())
    }

    /// True for failures the reconnect loop recovers from
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RunnerError::ConnectionFailure(_) | RunnerError::HandshakeRejected(_)
        )
    }

    /// Stable reason code for the error
    pub fn reason_code(&self) -> &'static str {
        match self {
            RunnerError::TransportUnavailable(_) => "transport_unavailable",
            RunnerError::ConnectionFailure(_) => "connection_failure",
            RunnerError::HandshakeRejected(_) => "handshake_rejected",
            RunnerError::ShutDown => "shut_down",
            RunnerError::Config(_) => "invalid_config",
        }
    }
}
