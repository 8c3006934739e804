//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration, workers, or infrastructure.

pub mod errors;
pub mod handle;
pub mod replica;

pub use errors::{Result, RuntimeError};
pub use handle::InventoryHandle;
pub use replica::ReplicaHandle;
