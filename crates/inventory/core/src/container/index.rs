//! Read-optimized cache over a container's items.
//!
//! The index is never authoritative: it is rebuilt wholesale from the item
//! list after every committed batch and stores positions into that list.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::error;

use super::ContainerError;
use crate::identity::ItemId;
use crate::item::{Item, ItemKind, ItemQuery, Subkind};

/// Positions and totals derived from a container's item list.
#[derive(Clone, Debug, Default)]
pub struct DerivedIndex {
    by_id: HashMap<ItemId, usize>,
    by_kind: HashMap<ItemKind, Vec<usize>>,
    by_subkind: HashMap<(ItemKind, Subkind), Vec<usize>>,
    equipped: Vec<usize>,
    equipped_by_kind: HashMap<ItemKind, Vec<ItemId>>,
    kind_totals: HashMap<ItemKind, u64>,
    subkind_totals: HashMap<(ItemKind, Subkind), u64>,
    last_modified: Option<DateTime<Utc>>,
}

impl DerivedIndex {
    /// Rebuilds the index in O(n) over `items`.
    ///
    /// `equipped` is in equip order; the equipped views keep that order.
    pub fn rebuild(items: &[Item], equipped: &[ItemId]) -> Self {
        let mut index = Self {
            last_modified: Some(Utc::now()),
            ..Self::default()
        };

        for (position, item) in items.iter().enumerate() {
            index.by_id.insert(item.id, position);
            index.by_kind.entry(item.kind).or_default().push(position);
            index
                .by_subkind
                .entry((item.kind, item.subkind))
                .or_default()
                .push(position);
            *index.kind_totals.entry(item.kind).or_default() += u64::from(item.quantity);
            *index
                .subkind_totals
                .entry((item.kind, item.subkind))
                .or_default() += u64::from(item.quantity);
        }

        for id in equipped {
            if let Some(&position) = index.by_id.get(id) {
                index.equipped.push(position);
                index
                    .equipped_by_kind
                    .entry(items[position].kind)
                    .or_default()
                    .push(*id);
            }
        }

        index
    }

    pub fn item_count(&self) -> usize {
        self.by_id.len()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    /// Resolves an id against the item list this index was built from.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::ItemNotFound` when the id is unknown or the
    /// indexed position no longer holds that id. Both mean the index and the
    /// container disagree, so the miss is logged at error level.
    pub fn get_item<'a>(&self, items: &'a [Item], id: ItemId) -> Result<&'a Item, ContainerError> {
        match self.by_id.get(&id).and_then(|&position| items.get(position)) {
            Some(item) if item.id == id => Ok(item),
            _ => {
                error!(
                    target: "inventory::index",
                    item = %id,
                    indexed = self.by_id.len(),
                    held = items.len(),
                    "Derived index lookup failed"
                );
                Err(ContainerError::ItemNotFound { id })
            }
        }
    }

    /// Positions matching a query, in list order.
    pub fn positions(&self, query: ItemQuery) -> &[usize] {
        let positions = match query {
            ItemQuery::Kind(kind) => self.by_kind.get(&kind),
            ItemQuery::Subkind(kind, subkind) => self.by_subkind.get(&(kind, subkind)),
        };
        positions.map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count_of(&self, query: ItemQuery) -> usize {
        self.positions(query).len()
    }

    /// Positions of equipped items, in equip order.
    pub fn equipped_positions(&self) -> &[usize] {
        &self.equipped
    }

    /// Equipped ids of one kind, oldest first.
    pub fn equipped_of_kind(&self, kind: ItemKind) -> &[ItemId] {
        self.equipped_by_kind
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn equipped_count(&self, kind: ItemKind) -> usize {
        self.equipped_of_kind(kind).len()
    }

    pub fn kind_quantity(&self, kind: ItemKind) -> u64 {
        self.kind_totals.get(&kind).copied().unwrap_or(0)
    }

    pub fn subkind_quantity(&self, kind: ItemKind, subkind: Subkind) -> u64 {
        self.subkind_totals
            .get(&(kind, subkind))
            .copied()
            .unwrap_or(0)
    }

    /// Time of the last rebuild; `None` for an index that was never built.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<Item> {
        vec![
            Item::with_id(ItemId::from_u128(1), ItemKind::Clothing, Subkind(1), 1),
            Item::with_id(ItemId::from_u128(2), ItemKind::Consumable, Subkind(7), 40),
            Item::with_id(ItemId::from_u128(3), ItemKind::Clothing, Subkind(2), 1),
            Item::with_id(ItemId::from_u128(4), ItemKind::Consumable, Subkind(7), 15),
        ]
    }

    #[test]
    fn rebuild_groups_by_kind_and_subkind() {
        let items = items();
        let index = DerivedIndex::rebuild(&items, &[]);

        assert_eq!(index.item_count(), 4);
        assert_eq!(index.positions(ItemQuery::Kind(ItemKind::Clothing)), &[0, 2]);
        assert_eq!(
            index.positions(ItemQuery::Subkind(ItemKind::Consumable, Subkind(7))),
            &[1, 3]
        );
        assert_eq!(index.kind_quantity(ItemKind::Consumable), 55);
        assert_eq!(index.subkind_quantity(ItemKind::Clothing, Subkind(2)), 1);
        assert!(index.positions(ItemQuery::Kind(ItemKind::Booster)).is_empty());
        assert!(index.last_modified().is_some());
    }

    #[test]
    fn equipped_views_keep_equip_order() {
        let items = items();
        let equipped = [ItemId::from_u128(3), ItemId::from_u128(1)];
        let index = DerivedIndex::rebuild(&items, &equipped);

        assert_eq!(index.equipped_positions(), &[2, 0]);
        assert_eq!(index.equipped_of_kind(ItemKind::Clothing), &equipped);
        assert_eq!(index.equipped_count(ItemKind::Consumable), 0);
    }

    #[test]
    fn get_item_reports_missing_and_stale_entries() {
        let items = items();
        let index = DerivedIndex::rebuild(&items, &[]);

        assert_eq!(
            index.get_item(&items, ItemId::from_u128(2)).unwrap().quantity,
            40
        );
        assert_eq!(
            index.get_item(&items, ItemId::from_u128(9)),
            Err(ContainerError::ItemNotFound {
                id: ItemId::from_u128(9)
            })
        );

        // Index built from a different list than the one queried.
        let mut shifted = items.clone();
        shifted.remove(0);
        assert!(index.get_item(&shifted, ItemId::from_u128(2)).is_err());
    }
}
