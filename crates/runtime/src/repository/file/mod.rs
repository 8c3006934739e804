//! File-based repository implementation.

mod container;

pub use container::FileContainerRepository;
