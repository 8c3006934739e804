//! Async hosting for the inventory engine.
//!
//! This crate wires the synchronous rules and protocol state machines of
//! `inventory-core` into tokio workers. Consumers embed [`Runtime`] to host
//! authoritative containers, connect replica sessions, and follow committed
//! changes through [`InventoryHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator, builder, and configuration
//! - [`api`] exposes the handles and error types clients interact with
//! - [`events`] provides the topic-based event bus and replica events
//! - [`repository`] provides container storage reused by other crates
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod events;
pub mod repository;
pub mod runtime;

mod workers;

pub use api::{InventoryHandle, ReplicaHandle, Result, RuntimeError};
pub use events::{DropReason, EventBus, InventoryEvent, ReplicaEvent, Topic};
pub use repository::{
    ContainerRepository, FileContainerRepository, InMemoryContainerRepo, RepositoryError,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use workers::{RateLimiter, SessionId};
