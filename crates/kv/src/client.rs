//! ActorKv: validated access to one actor's namespace
//!
//! The client holds no lock and no cache. Concurrent calls go straight to the
//! host in the order they are issued; the host decides how they interleave.
//!
//! ## Validation
//!
//! Before any host call the client checks:
//! - every key encodes within the key limits (and is non-empty)
//! - batches have at most `max_batch_keys` keys
//! - values are non-empty and within `max_value_bytes`
//! - a put's encoded keys plus values fit in `max_put_payload_bytes`
//!
//! Failures are returned as `InvalidKey` / `LimitExceeded` and the host is
//! never called. Host errors are returned unchanged.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use actorhost_core::codec::encode_storage_key;
use actorhost_core::{CanonicalKey, Entry, Error, Key, KvHost, Limits, ListQuery, Result};

/// Client for a single actor's KV namespace
///
/// Built once with [`ActorKv::new`] or [`ActorKv::with_limits`]; there are no
/// setters, so a client handed to actor code cannot be reconfigured by it.
/// Cloning shares the underlying host.
#[derive(Clone)]
pub struct ActorKv {
    host: Arc<dyn KvHost>,
    limits: Limits,
}

impl std::fmt::Debug for ActorKv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorKv")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl ActorKv {
    /// Create a client with default limits
    pub fn new(host: Arc<dyn KvHost>) -> Self {
        Self::with_limits(host, Limits::default())
    }

    /// Create a client with custom limits
    pub fn with_limits(host: Arc<dyn KvHost>, limits: Limits) -> Self {
        ActorKv { host, limits }
    }

    /// Limits enforced by this client
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Get the entry at `key`
    ///
    /// Returns `Ok(None)` if the key does not exist.
    pub async fn get(&self, key: &Key) -> Result<Option<Entry>> {
        self.check_key(key)?;
        self.host.get(key).await.map_err(|e| host_failed("get", e))
    }

    /// Get several entries in one host call
    ///
    /// Keys that do not exist are absent from the returned map. An empty
    /// batch returns an empty map without calling the host.
    pub async fn get_batch(&self, keys: &[Key]) -> Result<BTreeMap<Key, Entry>> {
        self.check_keys(keys)?;
        if keys.is_empty() {
            return Ok(BTreeMap::new());
        }
        self.host
            .get_batch(keys)
            .await
            .map_err(|e| host_failed("get_batch", e))
    }

    /// List entries matching `query`
    ///
    /// Entries come back in key order, descending when `reverse` is set.
    /// With no `limit`, at most `default_list_limit` entries are returned.
    /// A limit of zero returns nothing. Truncation is silent: there is no
    /// continuation cursor.
    pub async fn list(
        &self,
        query: &ListQuery,
        reverse: bool,
        limit: Option<usize>,
    ) -> Result<Vec<(Key, Entry)>> {
        query.validate(&self.limits)?;

        let limit = Some(limit.unwrap_or(self.limits.default_list_limit));
        self.host
            .list(query, reverse, limit)
            .await
            .map_err(|e| host_failed("list", e))
    }

    /// Write `value` at `key`, replacing any previous value
    pub async fn put(&self, key: Key, value: Vec<u8>) -> Result<()> {
        let canonical = self.check_key(&key)?;
        self.limits.validate_value(&value)?;
        self.limits.validate_payload(canonical.len() + value.len())?;

        debug!(target: "actorhost::kv", key = %key, bytes = value.len(), "put");
        self.host
            .put(key, value)
            .await
            .map_err(|e| host_failed("put", e))
    }

    /// Write several entries in one host call
    ///
    /// The whole batch is validated before the host is called. Whether a
    /// failing host call leaves part of the batch applied depends on the
    /// host.
    pub async fn put_batch(&self, entries: BTreeMap<Key, Vec<u8>>) -> Result<()> {
        self.limits.validate_batch_len(entries.len())?;
        let mut payload = 0;
        for (key, value) in &entries {
            payload += self.check_key(key)?.len();
            self.limits.validate_value(value)?;
            payload += value.len();
        }
        self.limits.validate_payload(payload)?;
        if entries.is_empty() {
            return Ok(());
        }

        debug!(target: "actorhost::kv", keys = entries.len(), bytes = payload, "put_batch");
        self.host
            .put_batch(entries)
            .await
            .map_err(|e| host_failed("put_batch", e))
    }

    /// Remove `key`; removing an absent key succeeds
    pub async fn delete(&self, key: &Key) -> Result<()> {
        self.check_key(key)?;
        self.host.delete(key).await.map_err(|e| host_failed("delete", e))
    }

    /// Remove several keys in one host call
    pub async fn delete_batch(&self, keys: &[Key]) -> Result<()> {
        self.check_keys(keys)?;
        if keys.is_empty() {
            return Ok(());
        }
        self.host
            .delete_batch(keys)
            .await
            .map_err(|e| host_failed("delete_batch", e))
    }

    /// Remove every key in the namespace. Cannot be undone.
    pub async fn delete_all(&self) -> Result<()> {
        debug!(target: "actorhost::kv", "delete_all");
        self.host
            .delete_all()
            .await
            .map_err(|e| host_failed("delete_all", e))
    }

    fn check_key(&self, key: &Key) -> Result<CanonicalKey> {
        Ok(encode_storage_key(key, &self.limits)?)
    }

    fn check_keys(&self, keys: &[Key]) -> Result<()> {
        self.limits.validate_batch_len(keys.len())?;
        for key in keys {
            self.check_key(key)?;
        }
        Ok(())
    }
}

fn host_failed(op: &'static str, err: Error) -> Error {
    warn!(
        target: "actorhost::kv",
        op,
        reason = err.reason_code(),
        error = %err,
        "Host call failed"
    );
    err
}
