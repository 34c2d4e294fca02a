//! Contract types returned by every read
//!
//! Every write to a key advances its [`Version`]; every read returns the
//! value together with its [`Metadata`].
//!
//! ## Module Structure
//!
//! - `entry`: Value plus metadata (`Entry`, `Metadata`)
//! - `version`: Opaque version tokens
//! - `timestamp`: Microsecond timestamps

pub mod entry;
pub mod timestamp;
pub mod version;

// Re-exports
pub use entry::{Entry, Metadata};
pub use timestamp::Timestamp;
pub use version::Version;
