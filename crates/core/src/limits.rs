//! Size limits for keys, values and batches
//!
//! Limits are enforced at the client boundary before any host call is made,
//! except the storage quota which only the backend can measure.
//!
//! ## Contract
//!
//! The defaults are part of the public contract. Custom limits can be set
//! when a namespace client or backend is constructed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size limits for actor KV operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum encoded key length in bytes (default: 512)
    pub max_key_bytes: usize,

    /// Maximum raw segment length in bytes (default: 256)
    pub max_segment_bytes: usize,

    /// Maximum value length in bytes (default: 128KiB)
    pub max_value_bytes: usize,

    /// Maximum number of keys in a single batch call (default: 128)
    pub max_batch_keys: usize,

    /// Maximum encoded keys plus values in one put call (default: 976KiB)
    pub max_put_payload_bytes: usize,

    /// Maximum bytes stored per namespace (default: 1GiB)
    pub max_storage_bytes: usize,

    /// Cap applied to `list` when the caller gives no limit (default: 16384)
    pub default_list_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_key_bytes: 512,
            max_segment_bytes: 256,
            max_value_bytes: 128 * 1024,
            max_batch_keys: 128,
            max_put_payload_bytes: 976 * 1024,
            max_storage_bytes: 1024 * 1024 * 1024,
            default_list_limit: 16384,
        }
    }
}

impl Limits {
    /// Create limits with small values for testing
    pub fn with_small_limits() -> Self {
        Limits {
            max_key_bytes: 64,
            max_segment_bytes: 16,
            max_value_bytes: 32,
            max_batch_keys: 4,
            max_put_payload_bytes: 128,
            max_storage_bytes: 256,
            default_list_limit: 8,
        }
    }

    /// Validate the number of keys in a batch
    pub fn validate_batch_len(&self, len: usize) -> Result<(), LimitError> {
        if len > self.max_batch_keys {
            return Err(LimitError::TooManyKeys {
                actual: len,
                max: self.max_batch_keys,
            });
        }
        Ok(())
    }

    /// Validate a single value
    pub fn validate_value(&self, value: &[u8]) -> Result<(), LimitError> {
        if value.is_empty() {
            return Err(LimitError::EmptyValue);
        }
        if value.len() > self.max_value_bytes {
            return Err(LimitError::ValueTooLarge {
                actual: value.len(),
                max: self.max_value_bytes,
            });
        }
        Ok(())
    }

    /// Validate the total size of a put payload
    pub fn validate_payload(&self, payload_bytes: usize) -> Result<(), LimitError> {
        if payload_bytes > self.max_put_payload_bytes {
            return Err(LimitError::PayloadTooLarge {
                actual: payload_bytes,
                max: self.max_put_payload_bytes,
            });
        }
        Ok(())
    }

    /// Validate a namespace's size after a write
    pub fn validate_storage(&self, total_bytes: usize) -> Result<(), LimitError> {
        if total_bytes > self.max_storage_bytes {
            return Err(LimitError::StorageQuotaExceeded {
                actual: total_bytes,
                max: self.max_storage_bytes,
            });
        }
        Ok(())
    }
}

/// Limit violation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LimitError {
    /// Batch has more keys than allowed
    #[error("Too many keys: {actual} exceeds maximum {max}")]
    TooManyKeys {
        /// Number of keys given
        actual: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Values must contain at least one byte
    #[error("Value cannot be empty")]
    EmptyValue,

    /// Value exceeds maximum size
    #[error("Value too large: {actual} bytes exceeds maximum {max}")]
    ValueTooLarge {
        /// Value length in bytes
        actual: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Put payload exceeds maximum size
    #[error("Payload too large: {actual} bytes exceeds maximum {max}")]
    PayloadTooLarge {
        /// Payload size in bytes
        actual: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Namespace would exceed its storage quota
    #[error("Storage quota exceeded: {actual} bytes exceeds maximum {max}")]
    StorageQuotaExceeded {
        /// Namespace size after the write
        actual: usize,
        /// Maximum allowed
        max: usize,
    },
}

impl LimitError {
    /// Stable reason code for the error
    pub fn reason_code(&self) -> &'static str {
        match self {
            LimitError::TooManyKeys { .. } => "too_many_keys",
            LimitError::EmptyValue => "empty_value",
            LimitError::ValueTooLarge { .. } => "value_too_large",
            LimitError::PayloadTooLarge { .. } => "payload_too_large",
            LimitError::StorageQuotaExceeded { .. } => "storage_quota_exceeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_key_bytes, 512);
        assert_eq!(limits.max_value_bytes, 131072);
        assert_eq!(limits.max_batch_keys, 128);
        assert_eq!(limits.max_put_payload_bytes, 999424);
        assert_eq!(limits.max_storage_bytes, 1073741824);
        assert_eq!(limits.default_list_limit, 16384);
    }

    #[test]
    fn test_batch_len() {
        let limits = Limits::with_small_limits();
        assert!(limits.validate_batch_len(4).is_ok());
        assert_eq!(
            limits.validate_batch_len(5),
            Err(LimitError::TooManyKeys { actual: 5, max: 4 })
        );
    }

    #[test]
    fn test_value_validation() {
        let limits = Limits::with_small_limits();
        assert!(limits.validate_value(&[1u8; 32]).is_ok());
        assert_eq!(limits.validate_value(&[]), Err(LimitError::EmptyValue));
        assert!(matches!(
            limits.validate_value(&[1u8; 33]),
            Err(LimitError::ValueTooLarge { actual: 33, max: 32 })
        ));
    }

    #[test]
    fn test_payload_and_storage() {
        let limits = Limits::with_small_limits();
        assert!(limits.validate_payload(128).is_ok());
        assert!(limits.validate_payload(129).is_err());
        assert!(limits.validate_storage(256).is_ok());
        assert_eq!(
            limits.validate_storage(300).unwrap_err().reason_code(),
            "storage_quota_exceeded"
        );
    }

    #[test]
    fn test_partial_limits_deserialize_with_defaults() {
        let limits: Limits = serde::Deserialize::deserialize(
            serde::de::value::MapDeserializer::<_, serde::de::value::Error>::new(
                vec![("max_batch_keys", 16usize)].into_iter(),
            ),
        )
        .unwrap();
        assert_eq!(limits.max_batch_keys, 16);
        assert_eq!(limits.max_key_bytes, 512);
    }
}
