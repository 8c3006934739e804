//! Behavior table loader.

use std::collections::BTreeSet;
use std::path::Path;

use inventory_core::{BehaviorTables, ContainerKind, ContainerPolicy, ItemKind, ItemPolicy};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// One `[[containers]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerEntry {
    pub kind: ContainerKind,
    #[serde(flatten)]
    pub policy: ContainerPolicy,
}

/// One `[[items]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEntry {
    pub kind: ItemKind,
    #[serde(flatten)]
    pub policy: ItemPolicy,
}

/// Policy file structure for TOML files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyFile {
    #[serde(default)]
    pub containers: Vec<ContainerEntry>,
    #[serde(default)]
    pub items: Vec<ItemEntry>,
}

impl PolicyFile {
    /// Converts the parsed entries into complete behavior tables.
    ///
    /// Each kind may appear once, and every kind must appear.
    pub fn into_tables(self) -> LoadResult<BehaviorTables> {
        let mut seen_containers = BTreeSet::new();
        let mut seen_items = BTreeSet::new();
        let mut builder = BehaviorTables::builder();

        for entry in self.containers {
            if !seen_containers.insert(entry.kind) {
                anyhow::bail!("Duplicate container policy for {}", entry.kind);
            }
            builder = builder.container(entry.kind, entry.policy);
        }
        for entry in self.items {
            if !seen_items.insert(entry.kind) {
                anyhow::bail!("Duplicate item policy for {}", entry.kind);
            }
            builder = builder.item(entry.kind, entry.policy);
        }

        builder
            .build()
            .map_err(|e| anyhow::anyhow!("Invalid policy tables: {}", e))
    }
}

/// Loader for behavior tables from TOML files.
pub struct PolicyLoader;

impl PolicyLoader {
    /// Load behavior tables from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML file containing a PolicyFile
    pub fn load(path: &Path) -> LoadResult<BehaviorTables> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse behavior tables from TOML text.
    pub fn parse(content: &str) -> LoadResult<BehaviorTables> {
        let file: PolicyFile = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse policy TOML: {}", e))?;

        file.into_tables()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use inventory_core::EquipAction;

    use super::*;
    use crate::STANDARD_POLICIES;

    #[test]
    fn bundled_policies_match_standard_tables() {
        let tables = PolicyLoader::parse(STANDARD_POLICIES).expect("bundled policies parse");
        assert_eq!(tables, BehaviorTables::standard());
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(STANDARD_POLICIES.as_bytes()).unwrap();

        let tables = PolicyLoader::load(file.path()).unwrap();
        let booster = tables.item_policy(ItemKind::Booster).unwrap();
        assert_eq!(booster.equip_action, EquipAction::TimedBooster);
        assert_eq!(booster.max_type_quantity, Some(10));

        let wardrobe = tables.container_policy(ContainerKind::Wardrobe).unwrap();
        assert!(!wardrobe.accepts(ItemKind::Consumable));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = PolicyLoader::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }

    #[test]
    fn duplicate_kinds_are_rejected() {
        let doubled = format!(
            "{STANDARD_POLICIES}\n[[items]]\nkind = \"Furniture\"\nstack_size = 4\ncan_equip = false\ncan_delete = true\n"
        );
        let err = PolicyLoader::parse(&doubled).unwrap_err();
        assert!(err.to_string().contains("Duplicate item policy"));
    }

    #[test]
    fn incomplete_tables_are_rejected() {
        let partial = r#"
            [[containers]]
            kind = "Mailbox"
            max_size = 4
            can_add = true
            can_delete = true
            can_equip = false
            can_swap_in = false
            can_swap_out = true
            can_swap_between_same_kind = false
        "#;
        let err = PolicyLoader::parse(partial).unwrap_err();
        assert!(err.to_string().contains("Invalid policy tables"));
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let err = PolicyLoader::parse("[[containers]]\nkind = 7").unwrap_err();
        assert!(err.to_string().contains("Failed to parse policy TOML"));
    }
}
