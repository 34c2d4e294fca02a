//! One actor's ordered key space
//!
//! `NamespaceData` is a `BTreeMap` keyed by canonical key, so iteration order
//! is the codec's total order and list queries are plain range scans. It has
//! no locking of its own; `MemoryStore` wraps each namespace in a
//! `parking_lot::RwLock`.

use std::collections::BTreeMap;

use actorhost_core::{CanonicalKey, Entry, Key, LimitError, Limits, ScanRange, Version};

use crate::stored_entry::StoredEntry;

/// Ordered entries plus quota accounting for a single namespace
#[derive(Debug, Default)]
pub struct NamespaceData {
    entries: BTreeMap<CanonicalKey, StoredEntry>,
    size_bytes: usize,
}

impl NamespaceData {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no keys are stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes currently charged against the quota
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Look up a single entry
    pub fn get(&self, canonical: &CanonicalKey) -> Option<Entry> {
        self.entries.get(canonical).map(StoredEntry::to_entry)
    }

    /// Walk `range` in key order (or reversed), yielding at most `limit` entries
    pub fn scan(&self, range: &ScanRange, reverse: bool, limit: usize) -> Vec<(Key, Entry)> {
        if range.is_empty() || limit == 0 {
            return Vec::new();
        }

        let iter = self.entries.range(range.as_bounds());
        let to_pair = |(_, stored): (&CanonicalKey, &StoredEntry)| {
            (stored.key().clone(), stored.to_entry())
        };

        if reverse {
            iter.rev().take(limit).map(to_pair).collect()
        } else {
            iter.take(limit).map(to_pair).collect()
        }
    }

    /// Size of the namespace after writing `writes`, without applying them
    pub fn size_after(&self, writes: &[(CanonicalKey, Key, Vec<u8>)]) -> usize {
        let mut size = self.size_bytes;
        for (canonical, _, value) in writes {
            if let Some(old) = self.entries.get(canonical) {
                size = size.saturating_sub(old.charged_bytes(canonical));
            }
            size += canonical.len() + value.len();
        }
        size
    }

    /// Apply a batch of writes, checking the quota first
    ///
    /// Either every write is applied or none is. `next_version` is called
    /// once per write.
    pub fn apply_writes(
        &mut self,
        writes: Vec<(CanonicalKey, Key, Vec<u8>)>,
        limits: &Limits,
        mut next_version: impl FnMut() -> Version,
    ) -> Result<(), LimitError> {
        limits.validate_storage(self.size_after(&writes))?;

        for (canonical, key, value) in writes {
            let version = next_version();
            let stored = match self.entries.get(&canonical) {
                Some(previous) => StoredEntry::overwritten(previous, value, version),
                None => StoredEntry::created(key, value, version),
            };
            self.insert(canonical, stored);
        }
        Ok(())
    }

    /// Remove a key, returning true if it existed
    pub fn remove(&mut self, canonical: &CanonicalKey) -> bool {
        match self.entries.remove(canonical) {
            Some(old) => {
                self.size_bytes -= old.charged_bytes(canonical);
                true
            }
            None => false,
        }
    }

    /// Remove every key
    pub fn clear(&mut self) {
        self.entries.clear();
        self.size_bytes = 0;
    }

    fn insert(&mut self, canonical: CanonicalKey, stored: StoredEntry) {
        let added = stored.charged_bytes(&canonical);
        if let Some(old) = self.entries.insert(canonical.clone(), stored) {
            self.size_bytes -= old.charged_bytes(&canonical);
        }
        self.size_bytes += added;
    }
}
