//! Core types and traits for actor KV storage
//!
//! This crate defines the foundational types shared by clients and backends:
//! - Key: Ordered sequence of byte segments
//! - codec: Canonical, order-preserving key encoding (CanonicalKey)
//! - Entry / Metadata: Value plus version token and creation time
//! - ListQuery / ScanRange: List queries and their compiled key ranges
//! - Limits: Key, value, batch and storage limits
//! - Error: Error taxonomy
//! - KvHost: The host operation boundary
//! - ActorId: Namespace owner identity

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod contract;
pub mod error;
pub mod key;
pub mod limits;
pub mod query;
pub mod traits;
pub mod types;

pub use codec::CanonicalKey;
pub use contract::{Entry, Metadata, Timestamp, Version};
pub use error::{Error, Result};
pub use key::{Key, KeyError};
pub use limits::{LimitError, Limits};
pub use query::{ListQuery, ScanRange};
pub use traits::KvHost;
pub use types::ActorId;
