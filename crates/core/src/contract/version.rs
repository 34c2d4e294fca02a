//! Version tokens
//!
//! A version is an opaque marker that changes on every successful write to a
//! key and is never reused. It detects changes; it does not order writes in
//! wall-clock time, and callers must not rely on arithmetic between tokens.

use serde::{Deserialize, Serialize};

/// Opaque version token attached to every stored entry
///
/// ## Invariants
///
/// - A new token is issued for every write, across all namespaces of a backend
/// - Tokens are never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version(u64);

impl Version {
    /// Wrap a raw token issued by a backend
    pub const fn from_raw(raw: u64) -> Self {
        Version(raw)
    }

    /// Raw token value, for storage and display only
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}
