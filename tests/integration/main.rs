//! Integration Tests
//!
//! Cross-crate tests through the `actorhost` facade:
//! - kv_namespaces: many actors sharing one MemoryStore through ActorKv
//! - runner_plane: a runner connected to an in-process management plane

#[path = "../common/mod.rs"]
mod common;

mod kv_namespaces;
mod runner_plane;
