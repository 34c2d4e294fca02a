//! MemoryStore: in-process backend for actor KV namespaces
//!
//! This module implements the `KvHost` boundary using:
//! - `DashMap<ActorId, _>` so different actors never contend on one lock
//! - `parking_lot::RwLock<NamespaceData>` per namespace for ordered storage
//! - `AtomicU64` for version tokens that are unique across the whole store
//!
//! # Design Notes
//!
//! - **Implicit creation**: a namespace is created on its first write; reads
//!   of an unknown actor see an empty namespace and create nothing
//! - **Boundary validation**: keys and queries are re-validated here, so a
//!   host never trusts bytes it did not encode itself
//! - **Batch application**: a batch is applied under a single write lock, so
//!   readers never observe half a batch

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use actorhost_core::codec::encode_storage_key;
use actorhost_core::{ActorId, CanonicalKey, Entry, Key, KvHost, Limits, ListQuery, Result, Version};

use crate::namespace::NamespaceData;

type SharedNamespace = Arc<RwLock<NamespaceData>>;

#[derive(Debug)]
struct StoreInner {
    namespaces: DashMap<ActorId, SharedNamespace>,
    version: AtomicU64,
    limits: Limits,
}

impl StoreInner {
    /// Allocate the next version token
    ///
    /// Tokens start at 1 and are never reused.
    fn next_version(&self) -> Version {
        Version::from_raw(self.version.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn existing(&self, actor_id: &ActorId) -> Option<SharedNamespace> {
        self.namespaces.get(actor_id).map(|ns| Arc::clone(ns.value()))
    }

    /// Run `f` against an existing namespace under its read lock
    fn read<R>(&self, actor_id: &ActorId, f: impl FnOnce(&NamespaceData) -> R) -> Option<R> {
        let namespace = self.existing(actor_id)?;
        let data = namespace.read();
        Some(f(&data))
    }

    fn get_or_create(&self, actor_id: ActorId) -> SharedNamespace {
        match self.namespaces.entry(actor_id) {
            MapEntry::Occupied(occupied) => Arc::clone(occupied.get()),
            MapEntry::Vacant(vacant) => {
                debug!(
                    target: "actorhost::storage",
                    %actor_id,
                    "Creating namespace on first write"
                );
                Arc::clone(vacant.insert(Arc::default()).value())
            }
        }
    }
}

/// In-memory store holding one namespace per actor
///
/// Cloning is cheap and shares the underlying data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl MemoryStore {
    /// Create an empty store with default limits
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Create an empty store with custom limits
    pub fn with_limits(limits: Limits) -> Self {
        MemoryStore {
            inner: Arc::new(StoreInner {
                namespaces: DashMap::new(),
                version: AtomicU64::new(0),
                limits,
            }),
        }
    }

    /// Limits enforced by this store
    pub fn limits(&self) -> &Limits {
        &self.inner.limits
    }

    /// Bind a host to one actor's namespace
    pub fn host(&self, actor_id: ActorId) -> MemoryHost {
        MemoryHost {
            store: Arc::clone(&self.inner),
            actor_id,
        }
    }

    /// Drop an actor's whole namespace. Cannot be undone.
    ///
    /// Returns true if the namespace existed.
    pub fn destroy(&self, actor_id: ActorId) -> bool {
        let existed = self.inner.namespaces.remove(&actor_id).is_some();
        if existed {
            debug!(target: "actorhost::storage", %actor_id, "Destroyed namespace");
        }
        existed
    }

    /// Bytes charged against an actor's storage quota
    pub fn storage_size(&self, actor_id: ActorId) -> usize {
        self.inner
            .read(&actor_id, NamespaceData::size_bytes)
            .unwrap_or(0)
    }

    /// Number of namespaces that currently exist
    pub fn namespace_count(&self) -> usize {
        self.inner.namespaces.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// `KvHost` bound to a single actor's namespace in a [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryHost {
    store: Arc<StoreInner>,
    actor_id: ActorId,
}

impl MemoryHost {
    /// The actor whose namespace this host serves
    pub fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    fn encode(&self, key: &Key) -> Result<CanonicalKey> {
        Ok(encode_storage_key(key, &self.store.limits)?)
    }

    fn encode_all(&self, keys: &[Key]) -> Result<Vec<CanonicalKey>> {
        keys.iter().map(|key| self.encode(key)).collect()
    }

    fn write(&self, entries: BTreeMap<Key, Vec<u8>>) -> Result<()> {
        let writes = entries
            .into_iter()
            .map(|(key, value)| -> Result<_> { Ok((self.encode(&key)?, key, value)) })
            .collect::<Result<Vec<_>>>()?;
        if writes.is_empty() {
            return Ok(());
        }

        let namespace = self.store.get_or_create(self.actor_id);
        let mut data = namespace.write();
        data.apply_writes(writes, &self.store.limits, || self.store.next_version())?;
        Ok(())
    }

    fn remove(&self, keys: &[Key]) -> Result<()> {
        let canonical = self.encode_all(keys)?;
        if let Some(namespace) = self.store.existing(&self.actor_id) {
            let mut data = namespace.write();
            for key in &canonical {
                data.remove(key);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl KvHost for MemoryHost {
    async fn get(&self, key: &Key) -> Result<Option<Entry>> {
        let canonical = self.encode(key)?;
        Ok(self
            .store
            .read(&self.actor_id, |data| data.get(&canonical))
            .flatten())
    }

    async fn get_batch(&self, keys: &[Key]) -> Result<BTreeMap<Key, Entry>> {
        let canonical = self.encode_all(keys)?;
        Ok(self
            .store
            .read(&self.actor_id, |data| {
                keys.iter()
                    .zip(canonical.iter())
                    .filter_map(|(key, canonical)| {
                        data.get(canonical).map(|entry| (key.clone(), entry))
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list(
        &self,
        query: &ListQuery,
        reverse: bool,
        limit: Option<usize>,
    ) -> Result<Vec<(Key, Entry)>> {
        let range = query.compile(&self.store.limits)?;
        let limit = limit.unwrap_or(self.store.limits.default_list_limit);

        Ok(self
            .store
            .read(&self.actor_id, |data| data.scan(&range, reverse, limit))
            .unwrap_or_default())
    }

    async fn put(&self, key: Key, value: Vec<u8>) -> Result<()> {
        self.write(BTreeMap::from([(key, value)]))
    }

    async fn put_batch(&self, entries: BTreeMap<Key, Vec<u8>>) -> Result<()> {
        self.write(entries)
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        self.remove(std::slice::from_ref(key))
    }

    async fn delete_batch(&self, keys: &[Key]) -> Result<()> {
        self.remove(keys)
    }

    async fn delete_all(&self) -> Result<()> {
        if let Some(namespace) = self.store.existing(&self.actor_id) {
            namespace.write().clear();
            debug!(target: "actorhost::storage", actor_id = %self.actor_id, "Cleared namespace");
        }
        Ok(())
    }
}
