//! Hierarchical keys for actor KV namespaces
//!
//! A [`Key`] is an ordered sequence of opaque byte segments. Keys are never
//! flattened into a single string: `["a", "b"]` and `["a/b"]` are different
//! keys. The derived ordering is segment-wise lexicographic (byte-wise within
//! a segment, shorter sequences first on a shared prefix), which is exactly
//! the order produced by comparing canonical encodings.
//!
//! ## Contract
//!
//! - Keys used as storage addresses must have at least one segment
//! - Each segment must not exceed `max_segment_bytes` (default: 256)
//! - The canonical encoding must not exceed `max_key_bytes` (default: 512)

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Separator used by [`Key::from_path`]
pub const PATH_SEPARATOR: char = '/';

/// A composite key made of ordered byte segments
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key {
    segments: SmallVec<[Vec<u8>; 4]>,
}

impl Key {
    /// Create a key from its segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Vec<u8>>,
    {
        Key {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// The empty key (zero segments)
    ///
    /// Only meaningful as a list prefix, where it matches the whole namespace.
    pub fn empty() -> Self {
        Key::default()
    }

    /// Split a `/`-separated path into segments
    ///
    /// ```
    /// use actorhost_core::Key;
    ///
    /// let key = Key::from_path("users/42/profile");
    /// assert_eq!(key.len(), 3);
    /// assert_eq!(key, Key::new(["users", "42", "profile"]));
    /// ```
    pub fn from_path(path: &str) -> Self {
        Key::new(path.split(PATH_SEPARATOR))
    }

    /// Borrow the segments
    pub fn segments(&self) -> &[Vec<u8>] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when the key has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a segment, returning the extended key
    pub fn child(mut self, segment: impl Into<Vec<u8>>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// True if every segment of `prefix` equals the leading segments of `self`
    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self
                .segments
                .iter()
                .zip(prefix.segments.iter())
                .all(|(a, b)| a == b)
    }

    pub(crate) fn push_segment(&mut self, segment: Vec<u8>) {
        self.segments.push(segment);
    }
}

impl std::fmt::Display for Key {
    /// Lossy path rendering, for logs only
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", PATH_SEPARATOR)?;
            }
            write!(f, "{}", String::from_utf8_lossy(segment))?;
        }
        Ok(())
    }
}

impl From<&str> for Key {
    /// Single-segment key
    fn from(segment: &str) -> Self {
        Key::new([segment])
    }
}

impl From<Vec<Vec<u8>>> for Key {
    fn from(segments: Vec<Vec<u8>>) -> Self {
        Key::new(segments)
    }
}

/// Key validation errors
///
/// These errors map to the `InvalidKey` error kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Key has no segments but addresses a stored entry
    #[error("Key cannot be empty")]
    Empty,

    /// A single segment exceeds the per-segment limit
    #[error("Key segment {index} too long: {actual} bytes exceeds maximum {max}")]
    SegmentTooLong {
        /// Position of the offending segment
        index: usize,
        /// Actual segment length in bytes
        actual: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// Encoded key exceeds the maximum length
    #[error("Key too long: {actual} encoded bytes exceeds maximum {max}")]
    TooLong {
        /// Encoded key length in bytes
        actual: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// Bytes are not a valid canonical encoding
    #[error("Malformed canonical key at byte {offset}: {reason}")]
    Malformed {
        /// Offset of the first invalid byte
        offset: usize,
        /// What was wrong
        reason: &'static str,
    },
}

impl KeyError {
    /// Stable reason code for the error
    pub fn reason_code(&self) -> &'static str {
        match self {
            KeyError::Empty => "empty_key",
            KeyError::SegmentTooLong { .. } => "segment_too_long",
            KeyError::TooLong { .. } => "key_too_long",
            KeyError::Malformed { .. } => "malformed_key",
        }
    }
}
