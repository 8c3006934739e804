//! Default inventory loader.

use std::path::Path;
use std::sync::Arc;

use inventory_core::{BehaviorTables, DefaultInventories};

use crate::loaders::{LoadResult, read_file};

/// Loader for default inventories from RON files.
pub struct SeedLoader;

impl SeedLoader {
    /// Load default inventories from a RON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the RON file containing DefaultInventories
    pub fn load(path: &Path) -> LoadResult<DefaultInventories> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse default inventories from RON text.
    pub fn parse(content: &str) -> LoadResult<DefaultInventories> {
        ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse default inventories RON: {}", e))
    }

    /// Load and check every seed list against `tables`.
    pub fn load_validated(
        path: &Path,
        tables: &Arc<BehaviorTables>,
    ) -> LoadResult<DefaultInventories> {
        let defaults = Self::load(path)?;
        defaults
            .validate(tables)
            .map_err(|e| anyhow::anyhow!("Invalid default inventories {}: {}", path.display(), e))?;
        Ok(defaults)
    }
}
