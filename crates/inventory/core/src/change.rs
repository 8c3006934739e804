//! Change records: the unit of replication.

use crate::item::Item;

/// What a [`ChangeRecord`] did to its item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ChangeAction {
    Add,
    Remove,
    Equip,
    Unequip,
    /// Quantity or attributes of an existing entry changed.
    Update,
}

impl ChangeAction {
    /// Wire action code.
    pub const fn code(&self) -> u8 {
        match self {
            ChangeAction::Add => 1,
            ChangeAction::Remove => 2,
            ChangeAction::Equip => 3,
            ChangeAction::Unequip => 4,
            ChangeAction::Update => 5,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ChangeAction::Add),
            2 => Some(ChangeAction::Remove),
            3 => Some(ChangeAction::Equip),
            4 => Some(ChangeAction::Unequip),
            5 => Some(ChangeAction::Update),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Add => "add",
            ChangeAction::Remove => "remove",
            ChangeAction::Equip => "equip",
            ChangeAction::Unequip => "unequip",
            ChangeAction::Update => "update",
        }
    }
}

/// Immutable description of one mutation: the action and the item as it
/// looked right after the action was applied (before it, for removals).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeRecord {
    action: ChangeAction,
    item: Item,
}

impl ChangeRecord {
    pub fn new(action: ChangeAction, mut item: Item) -> Self {
        // Snapshots never carry the local back-reference.
        item.owner = None;
        Self { action, item }
    }

    pub fn action(&self) -> ChangeAction {
        self.action
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn into_item(self) -> Item {
        self.item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::OwnerId;
    use crate::item::{ItemKind, Subkind};

    #[test]
    fn action_codes_round_trip() {
        for action in [
            ChangeAction::Add,
            ChangeAction::Remove,
            ChangeAction::Equip,
            ChangeAction::Unequip,
            ChangeAction::Update,
        ] {
            assert_eq!(ChangeAction::from_code(action.code()), Some(action));
        }
        assert_eq!(ChangeAction::from_code(0), None);
        assert_eq!(ChangeAction::from_code(6), None);
    }

    #[test]
    fn snapshot_drops_owner_back_reference() {
        let mut item = Item::new(ItemKind::Furniture, Subkind(2), 1);
        item.owner = Some(OwnerId(9));
        let record = ChangeRecord::new(ChangeAction::Add, item);
        assert_eq!(record.item().owner, None);
    }
}
