//! Namespace client for per-actor key-value storage
//!
//! [`ActorKv`] is the only surface actor code sees. It validates every key,
//! value and batch against [`Limits`](actorhost_core::Limits) and then makes
//! exactly one [`KvHost`](actorhost_core::KvHost) call per logical operation.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;

pub use client::ActorKv;
