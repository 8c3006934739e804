//! Default contents for newly provisioned containers.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::container::{Container, ContainerError, ContainerSnapshot};
use crate::identity::{ItemId, OwnerId};
use crate::item::{Attributes, ContainerKind, Item, ItemKind, Subkind};
use crate::policy::BehaviorTables;

/// One seeded entry. Ids are generated per provisioned container.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SeedItem {
    pub kind: ItemKind,
    #[serde(default)]
    pub subkind: Subkind,
    pub quantity: u32,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub equipped: bool,
}

impl SeedItem {
    pub fn new(kind: ItemKind, subkind: Subkind, quantity: u32) -> Self {
        Self {
            kind,
            subkind,
            quantity,
            attributes: Attributes::new(),
            equipped: false,
        }
    }

    #[must_use]
    pub fn equipped(mut self) -> Self {
        self.equipped = true;
        self
    }
}

/// Seed lists per container kind plus the kind created for a bare owner.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DefaultInventories {
    pub default_kind: ContainerKind,
    #[serde(default)]
    pub containers: BTreeMap<ContainerKind, Vec<SeedItem>>,
}

impl Default for DefaultInventories {
    fn default() -> Self {
        Self::empty(ContainerKind::PlayerInventory)
    }
}

impl DefaultInventories {
    pub fn empty(default_kind: ContainerKind) -> Self {
        Self {
            default_kind,
            containers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_seed(mut self, kind: ContainerKind, items: Vec<SeedItem>) -> Self {
        self.containers.insert(kind, items);
        self
    }

    pub fn default_kind(&self) -> ContainerKind {
        self.default_kind
    }

    pub fn seed(&self, kind: ContainerKind) -> &[SeedItem] {
        self.containers.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Materializes the seed for `kind` with fresh item ids.
    pub fn snapshot(&self, owner: OwnerId, kind: ContainerKind) -> ContainerSnapshot {
        let mut snapshot = ContainerSnapshot::empty(owner, kind);
        for seed in self.seed(kind) {
            let item = Item {
                attributes: seed.attributes.clone(),
                ..Item::with_id(ItemId::generate(), seed.kind, seed.subkind, seed.quantity)
            };
            if seed.equipped {
                snapshot.equipped.push(item.id);
            }
            snapshot.items.push(item);
        }
        snapshot
    }

    /// Checks every seed list against the policies it will be created under.
    ///
    /// # Errors
    ///
    /// Returns the first broken rule, so a bad seed file fails at startup
    /// instead of on first provisioning.
    pub fn validate(&self, tables: &Arc<BehaviorTables>) -> Result<(), ContainerError> {
        tables.container_policy(self.default_kind)?;
        for &kind in self.containers.keys() {
            let snapshot = self.snapshot(OwnerId(0), kind);
            Container::from_snapshot(snapshot, Arc::clone(tables))?.check_invariants()?;
        }
        Ok(())
    }
}
