//! RunnerConnection: keeps one management-plane connection alive
//!
//! # State machine
//!
//! ```text
//! Disconnected --connect()--> Connecting
//! Connecting   --open + handshake ok--> Connected      (attempt = 0)
//! Connecting   --open/handshake error--> Backoff { attempt, delay }
//! Connected    --peer close / io error--> Backoff { attempt, delay }
//! Backoff      --delay elapsed--> Connecting           (attempt += 1)
//! any          --shutdown()--> Disconnected            (terminal)
//! ```
//!
//! The loop runs on its own tokio task and never gives up on its own. A
//! shutdown is observed at every await point: while opening, during the
//! handshake, while connected and while sleeping in backoff.
//!
//! # Lost runners
//!
//! With `lost_threshold_ms` set, a session that drops starts a timer. If no
//! new connection is established before it expires, a
//! [`ConnectionEvent::Lost`] is published and [`RunnerConnection::is_lost`]
//! turns true until the next `Connected`. The timer runs alongside opens
//! and backoff waits without interrupting them.
//!
//! # Frames
//!
//! Outbound frames go through a bounded [`FrameSender`]. Frames queued while
//! disconnected wait in the channel and are sent once connected; a frame
//! whose send failed is retried first on the next connection. Inbound frames
//! are forwarded to the channel given to [`RunnerConnection::with_inbound`].

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backoff::BackoffConfig;
use crate::config::{RunnerConfig, RunnerIdentity};
use crate::error::{Result, RunnerError};
use crate::transport::{Connection, Handshake, Transport, TransportResolver};

/// Capacity of the state transition broadcast channel
const EVENT_BUFFER: usize = 64;

/// Observable state of a [`RunnerConnection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not running; initial and terminal state
    Disconnected,
    /// Opening the transport or running the handshake
    Connecting,
    /// Handshake completed, frames flowing
    Connected,
    /// Waiting `delay` before reconnect attempt `attempt + 1`
    Backoff {
        /// Failures since the last successful connection, minus one
        attempt: u32,
        /// Delay being waited out
        delay: Duration,
    },
}

impl ConnectionState {
    /// True in the `Connected` state
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Notification published on [`RunnerConnection::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The manager moved to a new state
    State(ConnectionState),
    /// No connection for `threshold` since the last session dropped
    Lost {
        /// The configured lost threshold
        threshold: Duration,
    },
}

impl ConnectionEvent {
    /// The new state, for `State` events
    pub fn state(&self) -> Option<ConnectionState> {
        match self {
            ConnectionEvent::State(state) => Some(*state),
            ConnectionEvent::Lost { .. } => None,
        }
    }
}

/// State publication shared between the handle and the loop task
struct StateCell {
    current: watch::Sender<ConnectionState>,
    events: broadcast::Sender<ConnectionEvent>,
    lost: AtomicBool,
}

impl StateCell {
    fn new() -> Self {
        let (current, _) = watch::channel(ConnectionState::Disconnected);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        StateCell {
            current,
            events,
            lost: AtomicBool::new(false),
        }
    }

    fn mark_lost(&self, threshold: Duration) {
        if !self.lost.swap(true, Ordering::SeqCst) {
            warn!(
                target: "actorhost::runner",
                threshold_ms = threshold.as_millis() as u64,
                "Runner lost"
            );
            let _ = self.events.send(ConnectionEvent::Lost { threshold });
        }
    }

    fn get(&self) -> ConnectionState {
        *self.current.borrow()
    }

    fn set(&self, next: ConnectionState) {
        if next.is_connected() && self.lost.swap(false, Ordering::SeqCst) {
            info!(target: "actorhost::runner", "Runner recovered");
        }
        let changed = self.current.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
        if changed {
            debug!(target: "actorhost::runner", state = ?next, "State transition");
            // No subscribers is fine
            let _ = self.events.send(ConnectionEvent::State(next));
        }
    }
}

/// Queues outbound frames for the connection
#[derive(Debug, Clone)]
pub struct FrameSender {
    tx: mpsc::Sender<Vec<u8>>,
}

impl FrameSender {
    /// Queue a frame, waiting while the buffer is full
    pub async fn send(&self, frame: Vec<u8>) -> Result<()> {
        self.tx.send(frame).await.map_err(|_| RunnerError::ShutDown)
    }

    /// Queue a frame without waiting
    ///
    /// Fails with `ConnectionFailure` when the buffer is full.
    pub fn try_send(&self, frame: Vec<u8>) -> Result<()> {
        self.tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                RunnerError::ConnectionFailure("outbound buffer full".into())
            }
            mpsc::error::TrySendError::Closed(_) => RunnerError::ShutDown,
        })
    }
}

enum Lifecycle {
    Idle(mpsc::Receiver<Vec<u8>>),
    Running(JoinHandle<()>),
    Stopped,
}

/// Resilient connection from a runner to the management plane
///
/// Only one manager should run per runner identity; each one performs its
/// own handshake.
pub struct RunnerConnection {
    config: RunnerConfig,
    resolver: Arc<TransportResolver>,
    handshake: Arc<dyn Handshake>,
    inbound: Option<mpsc::Sender<Vec<u8>>>,
    state: Arc<StateCell>,
    frames: FrameSender,
    cancel: CancellationToken,
    lifecycle: Mutex<Lifecycle>,
}

impl std::fmt::Debug for RunnerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerConnection")
            .field("endpoint", &self.config.endpoint)
            .field("runner_name", &self.config.runner_name)
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

impl RunnerConnection {
    /// Create a manager in the `Disconnected` state
    ///
    /// Fails with `Config` if `config` does not validate. Nothing is opened
    /// until [`connect`](Self::connect) is called.
    pub fn new(
        config: RunnerConfig,
        resolver: Arc<TransportResolver>,
        handshake: Arc<dyn Handshake>,
    ) -> Result<Self> {
        config.validate()?;
        let (tx, rx) = mpsc::channel(config.outbound_buffer);
        Ok(RunnerConnection {
            config,
            resolver,
            handshake,
            inbound: None,
            state: Arc::new(StateCell::new()),
            frames: FrameSender { tx },
            cancel: CancellationToken::new(),
            lifecycle: Mutex::new(Lifecycle::Idle(rx)),
        })
    }

    /// Forward inbound frames to `tx`
    pub fn with_inbound(mut self, tx: mpsc::Sender<Vec<u8>>) -> Self {
        self.inbound = Some(tx);
        self
    }

    /// The configuration this manager was built with
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Current state
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Receiver that always holds the latest state
    pub fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.state.current.subscribe()
    }

    /// Receiver for every state transition and lost notification from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.state.events.subscribe()
    }

    /// True while the runner has been out of contact past `lost_threshold_ms`
    pub fn is_lost(&self) -> bool {
        self.state.lost.load(Ordering::SeqCst)
    }

    /// Handle for queueing outbound frames
    pub fn frames(&self) -> FrameSender {
        self.frames.clone()
    }

    /// Start the connection loop
    ///
    /// Resolves the transport first and fails with `TransportUnavailable` if
    /// none exists. Calling `connect` on a running manager does nothing;
    /// calling it after [`shutdown`](Self::shutdown) fails with `ShutDown`.
    pub async fn connect(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        match &*lifecycle {
            Lifecycle::Running(_) => return Ok(()),
            Lifecycle::Stopped => return Err(RunnerError::ShutDown),
            Lifecycle::Idle(_) if self.cancel.is_cancelled() => return Err(RunnerError::ShutDown),
            Lifecycle::Idle(_) => {}
        }

        let transport = self.resolver.resolve_available().await?;
        let Lifecycle::Idle(outbound) = std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        else {
            return Err(RunnerError::ShutDown);
        };

        info!(
            target: "actorhost::runner",
            endpoint = %self.config.endpoint,
            runner = %self.config.runner_name,
            transport = transport.name(),
            "Starting runner connection"
        );

        let task = ConnectionLoop {
            endpoint: self.config.endpoint.clone(),
            identity: self.config.identity(),
            backoff: self.config.backoff.clone(),
            lost_threshold: self.config.lost_threshold(),
            transport,
            handshake: Arc::clone(&self.handshake),
            state: Arc::clone(&self.state),
            cancel: self.cancel.clone(),
            outbound,
            outbound_open: true,
            pending: None,
            inbound: self.inbound.clone(),
        };
        *lifecycle = Lifecycle::Running(tokio::spawn(task.run()));
        Ok(())
    }

    /// Stop the loop and wait for it to finish
    ///
    /// Interrupts any in-progress open, handshake or backoff wait. The state
    /// ends at `Disconnected` and the manager cannot be restarted.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let previous = {
            let mut lifecycle = self.lifecycle.lock().await;
            std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        };
        if let Lifecycle::Running(handle) = previous {
            if let Err(e) = handle.await {
                warn!(target: "actorhost::runner", error = %e, "Connection task failed");
            }
        }
        self.state.set(ConnectionState::Disconnected);
        info!(
            target: "actorhost::runner",
            runner = %self.config.runner_name,
            "Runner connection shut down"
        );
    }

    /// True once `shutdown` has been requested
    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for RunnerConnection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Why a connected session ended
enum SessionEnd {
    Cancelled,
    Lost(RunnerError),
}

/// State owned by the spawned loop task
struct ConnectionLoop {
    endpoint: String,
    identity: RunnerIdentity,
    backoff: BackoffConfig,
    lost_threshold: Option<Duration>,
    transport: Arc<dyn Transport>,
    handshake: Arc<dyn Handshake>,
    state: Arc<StateCell>,
    cancel: CancellationToken,
    outbound: mpsc::Receiver<Vec<u8>>,
    outbound_open: bool,
    pending: Option<Vec<u8>>,
    inbound: Option<mpsc::Sender<Vec<u8>>>,
}

impl ConnectionLoop {
    async fn run(mut self) {
        let mut attempt: u32 = 0;
        let mut lost_at: Option<Instant> = None;

        loop {
            self.state.set(ConnectionState::Connecting);
            let Some(opened) = self.guarded(self.open(), &mut lost_at).await else {
                break;
            };

            match opened {
                Ok(mut conn) => {
                    attempt = 0;
                    lost_at = None;
                    self.state.set(ConnectionState::Connected);
                    info!(target: "actorhost::runner", endpoint = %self.endpoint, "Connected");

                    match self.session(&mut *conn).await {
                        SessionEnd::Cancelled => {
                            if let Err(e) = conn.close().await {
                                debug!(
                                    target: "actorhost::runner",
                                    error = %e,
                                    "Close during shutdown failed"
                                );
                            }
                            break;
                        }
                        SessionEnd::Lost(e) => {
                            warn!(
                                target: "actorhost::runner",
                                reason = e.reason_code(),
                                error = %e,
                                "Connection lost"
                            );
                            lost_at = self
                                .lost_threshold
                                .map(|threshold| Instant::now() + threshold);
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        target: "actorhost::runner",
                        reason = e.reason_code(),
                        error = %e,
                        "Connection attempt failed"
                    );
                }
            }

            let delay = self.backoff.delay(attempt);
            self.state.set(ConnectionState::Backoff { attempt, delay });
            info!(
                target: "actorhost::runner",
                attempt = attempt.saturating_add(1),
                delay_ms = delay.as_millis() as u64,
                "Scheduling reconnect"
            );

            if self
                .guarded(tokio::time::sleep(delay), &mut lost_at)
                .await
                .is_none()
            {
                break;
            }
            attempt = attempt.saturating_add(1);
        }

        self.state.set(ConnectionState::Disconnected);
    }

    /// Drive `fut` to completion unless shutdown comes first
    ///
    /// Fires the lost notification if `lost_at` passes in the meantime.
    async fn guarded<F: Future>(
        &self,
        fut: F,
        lost_at: &mut Option<Instant>,
    ) -> Option<F::Output> {
        tokio::pin!(fut);
        loop {
            let deadline = *lost_at;
            let lost_timer = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                _ = lost_timer => {
                    *lost_at = None;
                    if let Some(threshold) = self.lost_threshold {
                        self.state.mark_lost(threshold);
                    }
                }
                output = &mut fut => return Some(output),
            }
        }
    }

    /// Open the transport and run the handshake
    async fn open(&self) -> Result<Box<dyn Connection>> {
        let mut conn = self.transport.open(&self.endpoint).await?;
        if let Err(e) = self.handshake.handshake(&self.identity, &mut *conn).await {
            let _ = conn.close().await;
            return Err(e);
        }
        info!(target: "actorhost::runner", runner = %self.identity.name, "Handshake accepted");
        Ok(conn)
    }

    /// Exchange frames until the connection drops or shutdown is requested
    async fn session(&mut self, conn: &mut dyn Connection) -> SessionEnd {
        if let Some(frame) = self.pending.take() {
            if let Err(e) = self.send(conn, frame).await {
                return SessionEnd::Lost(e);
            }
        }

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return SessionEnd::Cancelled,
                frame = self.outbound.recv(), if self.outbound_open => match frame {
                    Some(frame) => {
                        if let Err(e) = self.send(conn, frame).await {
                            return SessionEnd::Lost(e);
                        }
                    }
                    None => self.outbound_open = false,
                },
                received = conn.recv() => match received {
                    Ok(Some(frame)) => {
                        if !self.deliver(frame).await {
                            return SessionEnd::Cancelled;
                        }
                    }
                    Ok(None) => {
                        return SessionEnd::Lost(RunnerError::connection("closed by peer"));
                    }
                    Err(e) => return SessionEnd::Lost(e),
                },
            }
        }
    }

    /// Send a frame, keeping it for the next connection if the send fails
    async fn send(&mut self, conn: &mut dyn Connection, frame: Vec<u8>) -> Result<()> {
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Ok(()),
            sent = conn.send(frame.clone()) => sent,
        };
        if result.is_err() {
            self.pending = Some(frame);
        }
        result
    }

    /// Forward an inbound frame; false if shutdown interrupted the wait
    async fn deliver(&mut self, frame: Vec<u8>) -> bool {
        let Some(inbound) = &self.inbound else {
            return true;
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = inbound.send(frame) => {
                if sent.is_err() {
                    debug!(
                        target: "actorhost::runner",
                        "Inbound receiver dropped; discarding frames"
                    );
                    self.inbound = None;
                }
                true
            }
        }
    }
}
