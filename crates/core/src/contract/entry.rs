//! Stored entries and their metadata

use serde::{Deserialize, Serialize};

use super::{Timestamp, Version};

/// Versioning metadata returned with every read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Changes on every write to the key
    pub version: Version,
    /// Set on the first write to the key and kept across overwrites
    pub create_ts: Timestamp,
}

/// A value together with its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Raw value bytes
    pub value: Vec<u8>,
    /// Version and creation time
    pub metadata: Metadata,
}

impl Entry {
    /// Create an entry
    pub fn new(value: Vec<u8>, metadata: Metadata) -> Self {
        Entry { value, metadata }
    }

    /// Shortcut for `metadata.version`
    #[inline]
    pub fn version(&self) -> Version {
        self.metadata.version
    }

    /// Shortcut for `metadata.create_ts`
    #[inline]
    pub fn create_ts(&self) -> Timestamp {
        self.metadata.create_ts
    }
}
