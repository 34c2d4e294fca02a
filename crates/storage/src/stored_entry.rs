//! Storage-layer entry wrapper
//!
//! The contract type `Entry` carries the value and metadata returned to
//! callers. `StoredEntry` adds the decoded key so listing never has to decode
//! canonical bytes, plus the accounting needed for the storage quota.

use actorhost_core::{CanonicalKey, Entry, Key, Metadata, Timestamp, Version};

/// An entry as held by the in-memory backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    key: Key,
    value: Vec<u8>,
    metadata: Metadata,
}

impl StoredEntry {
    /// First write of a key
    pub fn created(key: Key, value: Vec<u8>, version: Version) -> Self {
        StoredEntry {
            key,
            value,
            metadata: Metadata {
                version,
                create_ts: Timestamp::now(),
            },
        }
    }

    /// Overwrite of an existing key: new value and version, same `create_ts`
    pub fn overwritten(previous: &StoredEntry, value: Vec<u8>, version: Version) -> Self {
        StoredEntry {
            key: previous.key.clone(),
            value,
            metadata: Metadata {
                version,
                create_ts: previous.metadata.create_ts,
            },
        }
    }

    /// The decoded key
    #[inline]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Version of the latest write
    #[inline]
    pub fn version(&self) -> Version {
        self.metadata.version
    }

    /// Contract view of this entry
    pub fn to_entry(&self) -> Entry {
        Entry::new(self.value.clone(), self.metadata)
    }

    /// Bytes charged against the namespace quota
    #[inline]
    pub fn charged_bytes(&self, canonical: &CanonicalKey) -> usize {
        canonical.len() + self.value.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_keeps_create_ts() {
        let first = StoredEntry::created(Key::from("k"), b"v1".to_vec(), Version::from_raw(1));
        let second = StoredEntry::overwritten(&first, b"v2".to_vec(), Version::from_raw(2));

        assert_eq!(second.to_entry().create_ts(), first.to_entry().create_ts());
        assert_ne!(second.version(), first.version());
        assert_eq!(second.to_entry().value, b"v2".to_vec());
        assert_eq!(second.key(), &Key::from("k"));
    }

    #[test]
    fn test_charged_bytes() {
        let key = Key::from("k");
        let canonical = actorhost_core::codec::encode(&key).unwrap();
        let entry = StoredEntry::created(key, vec![0u8; 10], Version::from_raw(1));
        assert_eq!(entry.charged_bytes(&canonical), 3 + 10);
    }
}
