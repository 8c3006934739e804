//! Content loaders for reading inventory data from files.

pub mod policies;
pub mod seeds;

pub use policies::{ContainerEntry, ItemEntry, PolicyFile, PolicyLoader};
pub use seeds::SeedLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
