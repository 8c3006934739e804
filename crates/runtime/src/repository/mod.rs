//! Repository layer for container state.
//!
//! Repositories persist the replicated state of each container keyed by its
//! owner. Rule tables and seed content are not stored here; they come from
//! `inventory-content` at startup.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileContainerRepository;
pub use memory::InMemoryContainerRepo;
pub use traits::ContainerRepository;
