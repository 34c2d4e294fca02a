//! In-memory backend for actor KV namespaces
//!
//! This crate implements the `KvHost` boundary with:
//! - MemoryStore: one ordered namespace per actor, sharded by ActorId
//! - MemoryHost: a `KvHost` bound to a single actor's namespace
//! - NamespaceData: BTreeMap over canonical keys with quota accounting
//! - Store-wide version tokens from an AtomicU64

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod namespace;
pub mod stored_entry;

pub use memory::{MemoryHost, MemoryStore};
pub use namespace::NamespaceData;
pub use stored_entry::StoredEntry;
