//! Shared test utilities for the integration suites.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use async_trait::async_trait;
use tokio::sync::mpsc;

use actorhost::{
    ActorId, ActorKv, Connection, Handshake, Limits, MemoryStore, RunnerError, RunnerIdentity,
    RunnerResult, Transport,
};

static INIT_TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::WARN)
            .try_init();
    });
}

/// A client for a fresh actor in `store`
pub fn actor_kv(store: &MemoryStore) -> (ActorId, ActorKv) {
    let actor_id = ActorId::new();
    let kv = ActorKv::with_limits(Arc::new(store.host(actor_id)), store.limits().clone());
    (actor_id, kv)
}

/// Store with small limits, shared by client and backend
pub fn small_store() -> MemoryStore {
    MemoryStore::with_limits(Limits::with_small_limits())
}

// ============================================================================
// In-process management plane
// ============================================================================

/// One accepted runner session as seen by the plane
pub struct PlaneSession {
    pub to_runner: mpsc::Sender<Vec<u8>>,
    pub from_runner: mpsc::UnboundedReceiver<Vec<u8>>,
}

/// Transport whose connections land on an in-process plane
pub struct LoopbackTransport {
    accepted: mpsc::UnboundedSender<PlaneSession>,
}

impl LoopbackTransport {
    /// Transport plus the receiver of sessions it opens
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PlaneSession>) {
        let (accepted, sessions) = mpsc::unbounded_channel();
        (Arc::new(LoopbackTransport { accepted }), sessions)
    }
}

struct LoopbackConnection {
    incoming: mpsc::Receiver<Vec<u8>>,
    outgoing: mpsc::UnboundedSender<Vec<u8>>,
}

#[async_trait]
impl Connection for LoopbackConnection {
    async fn send(&mut self, frame: Vec<u8>) -> RunnerResult<()> {
        self.outgoing
            .send(frame)
            .map_err(|_| RunnerError::connection("plane hung up"))
    }

    async fn recv(&mut self) -> RunnerResult<Option<Vec<u8>>> {
        Ok(self.incoming.recv().await)
    }

    async fn close(&mut self) -> RunnerResult<()> {
        self.incoming.close();
        Ok(())
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    fn name(&self) -> &str {
        "loopback"
    }

    async fn open(&self, _endpoint: &str) -> RunnerResult<Box<dyn Connection>> {
        let (to_runner, incoming) = mpsc::channel(64);
        let (outgoing, from_runner) = mpsc::unbounded_channel();
        self.accepted
            .send(PlaneSession {
                to_runner,
                from_runner,
            })
            .map_err(|_| RunnerError::connection("plane is down"))?;
        Ok(Box::new(LoopbackConnection { incoming, outgoing }))
    }
}

/// Sends the runner name as the first frame
pub struct HelloHandshake;

#[async_trait]
impl Handshake for HelloHandshake {
    async fn handshake(
        &self,
        identity: &RunnerIdentity,
        conn: &mut dyn Connection,
    ) -> RunnerResult<()> {
        conn.send(identity.name.as_bytes().to_vec()).await
    }
}
