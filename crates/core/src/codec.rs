//! Canonical byte encoding for [`Key`]s
//!
//! Every segment is written as a type byte (`0x01`), the segment bytes with
//! each `0x00` escaped as `0x00 0xFF`, and a `0x00` terminator:
//!
//! ```text
//! ["a", "b\0"]  =>  01 61 00 | 01 62 00 FF 00
//! ```
//!
//! The encoding is injective and order-preserving: comparing two canonical
//! keys byte-wise gives the same result as comparing the source keys
//! segment-wise. A terminator (`0x00`) always sorts below both the next
//! segment's type byte (`0x01`) and an escaped NUL (`0x00 0xFF`), so a
//! shorter segment sorts before any longer segment it prefixes.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::key::{Key, KeyError};
use crate::limits::Limits;

const SEGMENT_TYPE: u8 = 0x01;
const TERMINATOR: u8 = 0x00;
const ESCAPE: u8 = 0xFF;

/// Byte-level encoding of a [`Key`], used for storage addresses and ordering
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanonicalKey(Vec<u8>);

impl CanonicalKey {
    /// Borrow the encoded bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the encoded bytes
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Encoded length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the encoding of the empty key
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wrap raw bytes after checking they decode
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, KeyError> {
        decode(&bytes)?;
        Ok(CanonicalKey(bytes))
    }

    /// Smallest canonical key strictly greater than every key whose leading
    /// segments equal this key's segments
    ///
    /// Extensions of a key encode as the key itself followed by a segment
    /// type byte (`0x01`), so the bound is the encoding followed by `0x02`.
    /// Incrementing the final terminator instead would also admit keys whose
    /// last segment merely continues with an escaped NUL.
    pub fn prefix_upper_bound(&self) -> CanonicalKey {
        let mut bytes = Vec::with_capacity(self.0.len() + 1);
        bytes.extend_from_slice(&self.0);
        bytes.push(SEGMENT_TYPE + 1);
        CanonicalKey(bytes)
    }
}

impl AsRef<[u8]> for CanonicalKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Encode a key using default limits
pub fn encode(key: &Key) -> Result<CanonicalKey, KeyError> {
    encode_with_limits(key, &Limits::default())
}

/// Encode a key, enforcing segment and total length limits
///
/// The empty key encodes to the empty byte string. Whether an empty key is
/// acceptable is decided by the caller (see [`encode_storage_key`]).
pub fn encode_with_limits(key: &Key, limits: &Limits) -> Result<CanonicalKey, KeyError> {
    let mut out = Vec::with_capacity(encoded_len_hint(key));

    for (index, segment) in key.segments().iter().enumerate() {
        if segment.len() > limits.max_segment_bytes {
            return Err(KeyError::SegmentTooLong {
                index,
                actual: segment.len(),
                max: limits.max_segment_bytes,
            });
        }

        out.push(SEGMENT_TYPE);
        for &byte in segment {
            out.push(byte);
            if byte == TERMINATOR {
                out.push(ESCAPE);
            }
        }
        out.push(TERMINATOR);
    }

    if out.len() > limits.max_key_bytes {
        return Err(KeyError::TooLong {
            actual: out.len(),
            max: limits.max_key_bytes,
        });
    }

    Ok(CanonicalKey(out))
}

/// Encode a key that addresses a stored entry
///
/// Same as [`encode_with_limits`] but rejects the empty key.
pub fn encode_storage_key(key: &Key, limits: &Limits) -> Result<CanonicalKey, KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    encode_with_limits(key, limits)
}

/// Decode canonical bytes back into a key
pub fn decode(bytes: &[u8]) -> Result<Key, KeyError> {
    let mut key = Key::empty();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != SEGMENT_TYPE {
            return Err(KeyError::Malformed {
                offset: pos,
                reason: "expected segment type byte",
            });
        }
        pos += 1;

        let mut segment = Vec::new();
        loop {
            match bytes.get(pos) {
                None => {
                    return Err(KeyError::Malformed {
                        offset: pos,
                        reason: "unterminated segment",
                    })
                }
                Some(&TERMINATOR) => {
                    if bytes.get(pos + 1) == Some(&ESCAPE) {
                        segment.push(TERMINATOR);
                        pos += 2;
                    } else {
                        pos += 1;
                        break;
                    }
                }
                Some(&byte) => {
                    segment.push(byte);
                    pos += 1;
                }
            }
        }
        key.push_segment(segment);
    }

    Ok(key)
}

/// Total order over canonical keys
#[inline]
pub fn compare(a: &CanonicalKey, b: &CanonicalKey) -> Ordering {
    a.0.cmp(&b.0)
}

fn encoded_len_hint(key: &Key) -> usize {
    key.segments().iter().map(|s| s.len() + 2).sum()
}
