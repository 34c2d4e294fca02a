//! Transport seams and resolve-once transport lookup
//!
//! The connection manager never opens sockets itself. It is handed a
//! [`TransportResolver`] that picks one [`Transport`] for its lifetime:
//!
//! 1. an ambient transport supplied by the embedding process, if any
//! 2. otherwise a transport produced by an optional [`TransportLoader`]
//! 3. otherwise [`MissingTransport`], whose `open` always fails
//!
//! Resolution runs at most once. Concurrent callers before the first
//! resolution completes all wait on the same lookup, and the result is
//! cached, including the fallback to `MissingTransport`. A fresh resolver is
//! needed to try again.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, error};

use crate::config::RunnerIdentity;
use crate::error::{Result, RunnerError};

/// An open, bidirectional frame channel to the management plane
///
/// `recv` must be cancel-safe: the manager drops an in-flight `recv` when an
/// outbound frame or a shutdown arrives and calls it again later.
#[async_trait]
pub trait Connection: Send {
    /// Send one frame
    async fn send(&mut self, frame: Vec<u8>) -> Result<()>;

    /// Receive the next frame, `None` once the peer has closed
    async fn recv(&mut self) -> Result<Option<Vec<u8>>>;

    /// Close the channel
    async fn close(&mut self) -> Result<()>;
}

/// Factory for connections
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Why this transport cannot be used, if it cannot
    fn unavailable_reason(&self) -> Option<&str> {
        None
    }

    /// Open a connection to `endpoint`
    async fn open(&self, endpoint: &str) -> Result<Box<dyn Connection>>;
}

/// Authenticates a freshly opened connection
#[async_trait]
pub trait Handshake: Send + Sync {
    /// Run the handshake; an error sends the manager into backoff
    async fn handshake(&self, identity: &RunnerIdentity, conn: &mut dyn Connection) -> Result<()>;
}

/// Optional source of a transport, consulted when no ambient one is set
#[async_trait]
pub trait TransportLoader: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Produce a transport, or `None` if this loader has nothing to offer
    async fn load(&self) -> Option<Arc<dyn Transport>>;
}

/// Stand-in used when no transport could be found
#[derive(Debug, Clone)]
pub struct MissingTransport {
    reason: String,
}

impl MissingTransport {
    /// Stub that fails with `reason`
    pub fn new(reason: impl Into<String>) -> Self {
        MissingTransport {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Transport for MissingTransport {
    fn name(&self) -> &str {
        "missing"
    }

    fn unavailable_reason(&self) -> Option<&str> {
        Some(&self.reason)
    }

    async fn open(&self, _endpoint: &str) -> Result<Box<dyn Connection>> {
        Err(RunnerError::TransportUnavailable(self.reason.clone()))
    }
}

/// Picks one transport and remembers it
#[derive(Default)]
pub struct TransportResolver {
    ambient: Option<Arc<dyn Transport>>,
    loader: Option<Box<dyn TransportLoader>>,
    resolved: OnceCell<Arc<dyn Transport>>,
}

impl std::fmt::Debug for TransportResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResolver")
            .field("ambient", &self.ambient.as_ref().map(|t| t.name().to_string()))
            .field("loader", &self.loader.as_ref().map(|l| l.name().to_string()))
            .field("resolved", &self.resolved.get().map(|t| t.name().to_string()))
            .finish()
    }
}

impl TransportResolver {
    /// Resolver with no candidates; resolves to [`MissingTransport`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver that always yields `transport`
    pub fn fixed(transport: Arc<dyn Transport>) -> Self {
        Self::new().with_ambient(transport)
    }

    /// Set the ambient transport, tried first
    pub fn with_ambient(mut self, transport: Arc<dyn Transport>) -> Self {
        self.ambient = Some(transport);
        self
    }

    /// Set the loader, tried when there is no ambient transport
    pub fn with_loader(mut self, loader: impl TransportLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// True once a transport (or the stub) has been chosen
    pub fn is_resolved(&self) -> bool {
        self.resolved.initialized()
    }

    /// The chosen transport, resolving on first call
    pub async fn resolve(&self) -> Arc<dyn Transport> {
        Arc::clone(self.resolved.get_or_init(|| self.lookup()).await)
    }

    /// The chosen transport, or `TransportUnavailable` if only the stub was found
    pub async fn resolve_available(&self) -> Result<Arc<dyn Transport>> {
        let transport = self.resolve().await;
        match transport.unavailable_reason() {
            Some(reason) => Err(RunnerError::TransportUnavailable(reason.to_string())),
            None => Ok(transport),
        }
    }

    async fn lookup(&self) -> Arc<dyn Transport> {
        if let Some(ambient) = &self.ambient {
            debug!(
                target: "actorhost::transport",
                transport = ambient.name(),
                "Using ambient transport"
            );
            return Arc::clone(ambient);
        }
        debug!(target: "actorhost::transport", "No ambient transport");

        if let Some(loader) = &self.loader {
            match loader.load().await {
                Some(transport) => {
                    debug!(
                        target: "actorhost::transport",
                        loader = loader.name(),
                        transport = transport.name(),
                        "Loaded transport"
                    );
                    return transport;
                }
                None => debug!(
                    target: "actorhost::transport",
                    loader = loader.name(),
                    "Loader found no transport"
                ),
            }
        }

        let reason = match &self.loader {
            Some(loader) => format!(
                "no ambient transport and optional transport '{}' is not installed",
                loader.name()
            ),
            None => "no ambient transport and no transport loader configured".to_string(),
        };
        error!(target: "actorhost::transport", %reason, "Falling back to missing transport");
        Arc::new(MissingTransport::new(reason))
    }
}
