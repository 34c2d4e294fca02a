//! List queries and their compiled scan ranges
//!
//! A [`ListQuery`] names a slice of a namespace's key space. Backends call
//! [`ListQuery::compile`] to turn it into a [`ScanRange`] over canonical keys
//! and then walk their ordered index within that range.
//!
//! | Query | Lower bound | Upper bound |
//! |-------|-------------|-------------|
//! | `All` | unbounded | unbounded |
//! | `RangeInclusive(lo, hi)` | `>= lo` | `<= hi` |
//! | `RangeExclusive(lo, hi)` | `>= lo` | `< hi` |
//! | `Prefix(p)` | `>= p` | `<` every extension of `p` |

use std::ops::Bound;

use serde::{Deserialize, Serialize};

use crate::codec::{self, CanonicalKey};
use crate::key::{Key, KeyError};
use crate::limits::Limits;

/// Which keys a `list` call visits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListQuery {
    /// Every key in the namespace
    All,
    /// Keys `>= lower` and `<= upper`
    RangeInclusive(Key, Key),
    /// Keys `>= lower` and `< upper`
    RangeExclusive(Key, Key),
    /// Keys whose leading segments equal the prefix exactly
    Prefix(Key),
}

impl ListQuery {
    /// Keys under `prefix`
    pub fn prefix(prefix: impl Into<Key>) -> Self {
        ListQuery::Prefix(prefix.into())
    }

    /// Keys in `[lower, upper)`
    pub fn range(lower: impl Into<Key>, upper: impl Into<Key>) -> Self {
        ListQuery::RangeExclusive(lower.into(), upper.into())
    }

    /// Keys in `[lower, upper]`
    pub fn range_inclusive(lower: impl Into<Key>, upper: impl Into<Key>) -> Self {
        ListQuery::RangeInclusive(lower.into(), upper.into())
    }

    /// Check every key in the query against `limits`
    pub fn validate(&self, limits: &Limits) -> Result<(), KeyError> {
        self.compile(limits).map(|_| ())
    }

    /// Compile into a scan range over canonical keys
    pub fn compile(&self, limits: &Limits) -> Result<ScanRange, KeyError> {
        let range = match self {
            ListQuery::All => ScanRange::full(),
            ListQuery::RangeInclusive(lower, upper) => ScanRange {
                start: Bound::Included(codec::encode_with_limits(lower, limits)?),
                end: Bound::Included(codec::encode_with_limits(upper, limits)?),
            },
            ListQuery::RangeExclusive(lower, upper) => ScanRange {
                start: Bound::Included(codec::encode_with_limits(lower, limits)?),
                end: Bound::Excluded(codec::encode_with_limits(upper, limits)?),
            },
            ListQuery::Prefix(prefix) => {
                let lower = codec::encode_with_limits(prefix, limits)?;
                ScanRange {
                    end: Bound::Excluded(lower.prefix_upper_bound()),
                    start: Bound::Included(lower),
                }
            }
        };
        Ok(range)
    }
}

/// A compiled `[start, end]` / `[start, end)` range over canonical keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRange {
    /// Lower bound
    pub start: Bound<CanonicalKey>,
    /// Upper bound
    pub end: Bound<CanonicalKey>,
}

impl ScanRange {
    /// The whole key space
    pub fn full() -> Self {
        ScanRange {
            start: Bound::Unbounded,
            end: Bound::Unbounded,
        }
    }

    /// True if `key` falls inside the range
    pub fn contains(&self, key: &CanonicalKey) -> bool {
        let above = match &self.start {
            Bound::Included(s) => key >= s,
            Bound::Excluded(s) => key > s,
            Bound::Unbounded => true,
        };
        let below = match &self.end {
            Bound::Included(e) => key <= e,
            Bound::Excluded(e) => key < e,
            Bound::Unbounded => true,
        };
        above && below
    }

    /// True if no key can fall inside the range
    ///
    /// Ordered maps panic on inverted ranges, so backends check this first.
    pub fn is_empty(&self) -> bool {
        match (&self.start, &self.end) {
            (Bound::Unbounded, _) | (_, Bound::Unbounded) => false,
            (Bound::Included(s), Bound::Included(e)) => s > e,
            (Bound::Included(s), Bound::Excluded(e))
            | (Bound::Excluded(s), Bound::Included(e))
            | (Bound::Excluded(s), Bound::Excluded(e)) => s >= e,
        }
    }

    /// Borrowed bounds, suitable for `BTreeMap::range`
    pub fn as_bounds(&self) -> (Bound<&CanonicalKey>, Bound<&CanonicalKey>) {
        (self.start.as_ref(), self.end.as_ref())
    }
}
