//! Actorhost - per-actor key-value storage and resilient runner connections
//!
//! Two subsystems of an actor-hosting runtime live here:
//!
//! - **Actor KV**: every actor owns one isolated, ordered key-value
//!   namespace. Actor code talks to it through [`ActorKv`], which validates
//!   keys and limits and makes one [`KvHost`] call per operation.
//!   [`MemoryStore`] is the in-process backend.
//! - **Runner connection**: [`RunnerConnection`] keeps a runner connected to
//!   the management plane, backing off and reconnecting until shut down.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use actorhost::{ActorId, ActorKv, Key, ListQuery, MemoryStore};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = MemoryStore::new();
//! let kv = ActorKv::new(Arc::new(store.host(ActorId::new())));
//!
//! kv.put(Key::from_path("users/42"), b"alice".to_vec()).await?;
//! let entry = kv.get(&Key::from_path("users/42")).await?.unwrap();
//! assert_eq!(entry.value, b"alice".to_vec());
//!
//! let users = kv.list(&ListQuery::prefix("users"), false, None).await?;
//! assert_eq!(users.len(), 1);
//! # Ok::<(), actorhost::Error>(())
//! # }).unwrap();
//! ```

pub use actorhost_core::codec;
pub use actorhost_core::{
    ActorId, CanonicalKey, Entry, Error, Key, KeyError, KvHost, LimitError, Limits, ListQuery,
    Metadata, Result, ScanRange, Timestamp, Version,
};
pub use actorhost_kv::ActorKv;
pub use actorhost_runner::{
    BackoffConfig, Connection, ConnectionEvent, ConnectionState, FrameSender, Handshake,
    MissingTransport, RunnerConfig, RunnerConnection, RunnerError, RunnerIdentity, Transport,
    TransportLoader, TransportResolver,
};
pub use actorhost_runner::Result as RunnerResult;
pub use actorhost_storage::{MemoryHost, MemoryStore};
