//! Host operation boundary
//!
//! [`KvHost`] is the narrow seam between the namespace client and whatever
//! backend actually stores data. One host is bound to exactly one actor's
//! namespace; it has no way to name another actor's keys.
//!
//! Every method is one host round trip. Batches are a single call, never a
//! loop of single-key calls.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::contract::Entry;
use crate::error::Result;
use crate::key::Key;
use crate::query::ListQuery;

/// Storage operations for a single actor namespace
///
/// Thread safety: all methods may be called concurrently (requires
/// Send + Sync). The host decides how concurrent calls are isolated.
#[async_trait]
pub trait KvHost: Send + Sync {
    /// Get the entry at `key`, `None` if absent
    async fn get(&self, key: &Key) -> Result<Option<Entry>>;

    /// Get several entries; absent keys are missing from the result
    async fn get_batch(&self, keys: &[Key]) -> Result<BTreeMap<Key, Entry>>;

    /// List entries in key order (descending if `reverse`), at most `limit`
    async fn list(
        &self,
        query: &ListQuery,
        reverse: bool,
        limit: Option<usize>,
    ) -> Result<Vec<(Key, Entry)>>;

    /// Write `value` at `key`, advancing its version
    async fn put(&self, key: Key, value: Vec<u8>) -> Result<()>;

    /// Write several entries in one call
    async fn put_batch(&self, entries: BTreeMap<Key, Vec<u8>>) -> Result<()>;

    /// Remove `key`; absent keys are not an error
    async fn delete(&self, key: &Key) -> Result<()>;

    /// Remove several keys in one call
    async fn delete_batch(&self, keys: &[Key]) -> Result<()>;

    /// Remove every key in the namespace. Cannot be undone.
    async fn delete_all(&self) -> Result<()>;
}
