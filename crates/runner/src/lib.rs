//! Runner connection management
//!
//! A runner process keeps one authenticated connection to the management
//! plane open for its whole lifetime. This crate provides:
//! - BackoffConfig: reconnect delay calculation with optional jitter
//! - Transport / Connection / Handshake: the collaborator seams
//! - TransportResolver: resolve-once transport lookup with a stub fallback
//! - RunnerConnection: the connect / backoff / reconnect state machine,
//!   with an optional lost-runner notification
//! - RunnerConfig: TOML configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backoff;
pub mod config;
pub mod connection;
pub mod error;
pub mod transport;

pub use backoff::BackoffConfig;
pub use config::{RunnerConfig, RunnerIdentity, CONFIG_FILE_NAME};
pub use connection::{ConnectionEvent, ConnectionState, FrameSender, RunnerConnection};
pub use error::{Result, RunnerError};
pub use transport::{
    Connection, Handshake, MissingTransport, Transport, TransportLoader, TransportResolver,
};
