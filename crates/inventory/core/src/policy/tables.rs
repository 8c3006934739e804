//! Read-only rule tables keyed by kind.

use std::collections::BTreeMap;

use strum::IntoEnumIterator;

use super::{ContainerPolicy, EquipAction, ItemPolicy, PolicyError};
use crate::item::{ContainerKind, ItemKind};

/// Container and item policies, populated once at startup.
///
/// Shared as `Arc<BehaviorTables>`; nothing mutates a table after `build()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BehaviorTables {
    containers: BTreeMap<ContainerKind, ContainerPolicy>,
    items: BTreeMap<ItemKind, ItemPolicy>,
}

impl BehaviorTables {
    pub fn builder() -> BehaviorTablesBuilder {
        BehaviorTablesBuilder::default()
    }

    /// Looks up the policy for a container kind.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::UndefinedContainerPolicy` if the kind was never registered.
    pub fn container_policy(&self, kind: ContainerKind) -> Result<&ContainerPolicy, PolicyError> {
        self.containers
            .get(&kind)
            .ok_or(PolicyError::UndefinedContainerPolicy { kind })
    }

    /// Looks up the policy for an item kind.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::UndefinedItemPolicy` if the kind was never registered.
    pub fn item_policy(&self, kind: ItemKind) -> Result<&ItemPolicy, PolicyError> {
        self.items
            .get(&kind)
            .ok_or(PolicyError::UndefinedItemPolicy { kind })
    }

    pub fn container_policies(&self) -> impl Iterator<Item = (&ContainerKind, &ContainerPolicy)> {
        self.containers.iter()
    }

    pub fn item_policies(&self) -> impl Iterator<Item = (&ItemKind, &ItemPolicy)> {
        self.items.iter()
    }

    /// Built-in tables used when no policy file is configured.
    ///
    /// | Container | Size | Filter | Add | Delete | Equip | In | Out | Same kind |
    /// |---|---|---|---|---|---|---|---|---|
    /// | PlayerInventory | 64 | all | y | y | y | y | y | n |
    /// | Wardrobe | 32 | wearables | y | y | y | y | y | n |
    /// | SharedChest | 20 | all | y | n | n | y | y | y |
    /// | Mailbox | 16 | all | y | y | n | n | y | n |
    pub fn standard() -> Self {
        let wearables = [ItemKind::Clothing, ItemKind::Accessory, ItemKind::Nametag];

        let mut builder = Self::builder()
            .container(ContainerKind::PlayerInventory, ContainerPolicy::permissive(64))
            .container(
                ContainerKind::Wardrobe,
                ContainerPolicy::permissive(32).with_type_filter(wearables),
            )
            .container(
                ContainerKind::SharedChest,
                ContainerPolicy {
                    can_delete: false,
                    can_equip: false,
                    can_swap_between_same_kind: true,
                    ..ContainerPolicy::permissive(20)
                },
            )
            .container(
                ContainerKind::Mailbox,
                ContainerPolicy {
                    can_equip: false,
                    can_swap_in: false,
                    ..ContainerPolicy::permissive(16)
                },
            );

        builder = builder
            .item(ItemKind::Clothing, ItemPolicy::equippable(3))
            .item(ItemKind::Accessory, ItemPolicy::equippable(2))
            .item(
                ItemKind::Nametag,
                ItemPolicy {
                    min_equipped: 1,
                    force_equip_on_add: true,
                    ..ItemPolicy::equippable(1)
                },
            )
            .item(
                ItemKind::Booster,
                ItemPolicy {
                    max_type_quantity: Some(10),
                    equip_action: EquipAction::TimedBooster,
                    ..ItemPolicy::equippable(1)
                },
            )
            .item(
                ItemKind::Consumable,
                ItemPolicy {
                    max_type_quantity: Some(500),
                    ..ItemPolicy::stackable(99)
                },
            )
            .item(
                ItemKind::Currency,
                ItemPolicy {
                    max_type_quantity: Some(1_000_000),
                    can_delete: false,
                    ..ItemPolicy::stackable(1_000_000)
                },
            )
            .item(ItemKind::Furniture, ItemPolicy::stackable(1))
            .item(
                ItemKind::Collectible,
                ItemPolicy {
                    max_subtype_quantity: Some(1),
                    ..ItemPolicy::stackable(1)
                },
            )
            .item(
                ItemKind::QuestToken,
                ItemPolicy {
                    can_delete: false,
                    ..ItemPolicy::stackable(1)
                },
            );

        // The table above covers every kind; `build_partial` keeps this infallible.
        builder.build_partial()
    }
}

/// Builder that registers policies and checks completeness.
#[derive(Clone, Debug, Default)]
pub struct BehaviorTablesBuilder {
    containers: BTreeMap<ContainerKind, ContainerPolicy>,
    items: BTreeMap<ItemKind, ItemPolicy>,
}

impl BehaviorTablesBuilder {
    /// Registers (or replaces) a container policy.
    pub fn container(mut self, kind: ContainerKind, policy: ContainerPolicy) -> Self {
        self.containers.insert(kind, policy);
        self
    }

    /// Registers (or replaces) an item policy.
    pub fn item(mut self, kind: ItemKind, policy: ItemPolicy) -> Self {
        self.items.insert(kind, policy);
        self
    }

    /// Builds the tables, requiring a policy for every kind.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::IncompleteTables` naming every unregistered kind.
    pub fn build(self) -> Result<BehaviorTables, PolicyError> {
        let containers: Vec<ContainerKind> = ContainerKind::iter()
            .filter(|kind| !self.containers.contains_key(kind))
            .collect();
        let items: Vec<ItemKind> = ItemKind::iter()
            .filter(|kind| !self.items.contains_key(kind))
            .collect();

        if !containers.is_empty() || !items.is_empty() {
            return Err(PolicyError::IncompleteTables { containers, items });
        }

        Ok(self.build_partial())
    }

    /// Builds the tables without the completeness check.
    ///
    /// Lookups for unregistered kinds fail with an `Undefined*Policy` error.
    pub fn build_partial(self) -> BehaviorTables {
        BehaviorTables {
            containers: self.containers,
            items: self.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_tables_are_complete() {
        let tables = BehaviorTables::standard();
        let rebuilt = tables
            .container_policies()
            .fold(BehaviorTables::builder(), |builder, (kind, policy)| {
                builder.container(*kind, policy.clone())
            });
        let rebuilt = tables
            .item_policies()
            .fold(rebuilt, |builder, (kind, policy)| builder.item(*kind, policy.clone()));

        assert_eq!(rebuilt.build().unwrap(), tables);
    }

    #[test]
    fn build_reports_every_missing_kind() {
        let err = BehaviorTables::builder()
            .container(ContainerKind::PlayerInventory, ContainerPolicy::permissive(4))
            .item(ItemKind::Clothing, ItemPolicy::equippable(1))
            .build()
            .unwrap_err();

        match err {
            PolicyError::IncompleteTables { containers, items } => {
                assert!(!containers.contains(&ContainerKind::PlayerInventory));
                assert!(containers.contains(&ContainerKind::Mailbox));
                assert!(!items.contains(&ItemKind::Clothing));
                assert!(items.contains(&ItemKind::Currency));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn partial_tables_fail_lookups() {
        let tables = BehaviorTables::builder().build_partial();
        assert_eq!(
            tables.item_policy(ItemKind::Booster),
            Err(PolicyError::UndefinedItemPolicy {
                kind: ItemKind::Booster
            })
        );
        assert_eq!(
            tables.container_policy(ContainerKind::Wardrobe),
            Err(PolicyError::UndefinedContainerPolicy {
                kind: ContainerKind::Wardrobe
            })
        );
    }
}
