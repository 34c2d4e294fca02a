//! Error types for actor KV operations
//!
//! This module defines the error taxonomy shared by the client and backends.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! - `InvalidKey` and `LimitExceeded` are local and never retryable
//! - `HostCallFailure` comes from the backend and is passed through unchanged

use thiserror::Error;

use crate::key::KeyError;
use crate::limits::LimitError;

/// Result type alias for actor KV operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for actor KV operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// Key fails codec constraints
    #[error("Invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    /// Batch, value, payload or storage limit exceeded
    #[error("Limit exceeded: {0}")]
    LimitExceeded(#[from] LimitError),

    /// The underlying storage operation failed
    #[error("Host call failed: {0}")]
    HostCallFailure(String),
}

impl Error {
    /// Build a `HostCallFailure` from any displayable error
    pub fn host(err: impl std::fmt::Display) -> Self {
        Error::HostCallFailure(err.to_string())
    }

    /// True for errors raised before any host call was made
    pub fn is_local(&self) -> bool {
        matches!(self, Error::InvalidKey(_) | Error::LimitExceeded(_))
    }

    /// Stable reason code for the error
    pub fn reason_code(&self) -> &'static str {
        match self {
            Error::InvalidKey(e) => e.reason_code(),
            Error::LimitExceeded(e) => e.reason_code(),
            Error::HostCallFailure(_) => "host_call_failure",
        }
    }
}
