//! In-memory repository implementation for tests and local runs.

mod container;

pub use container::InMemoryContainerRepo;
