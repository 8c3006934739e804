/// Side effect selected when an item is equipped.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum EquipAction {
    #[default]
    None,
    /// Starts the item's timer from its `duration_secs` attribute.
    TimedBooster,
}

/// Stacking and equip rules for one [`crate::ItemKind`].
///
/// This is the only catalog fact the engine needs; display data lives with
/// the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ItemPolicy {
    /// Largest quantity a single entry may hold. 1 means non-stackable.
    pub stack_size: u32,
    /// Bound on the total quantity of one (kind, subkind) in a container.
    #[serde(default)]
    pub max_subtype_quantity: Option<u32>,
    /// Bound on the total quantity of the kind in a container.
    #[serde(default)]
    pub max_type_quantity: Option<u32>,
    pub can_equip: bool,
    #[serde(default)]
    pub max_equipped: u32,
    /// Only enforced while at least one item of the kind is held.
    #[serde(default)]
    pub min_equipped: u32,
    /// Allows the container to unequip an item on its own to make room.
    #[serde(default)]
    pub can_force_unequip: bool,
    #[serde(default)]
    pub force_equip_on_add: bool,
    pub can_delete: bool,
    #[serde(default)]
    pub equip_action: EquipAction,
}

impl ItemPolicy {
    /// Stackable goods that can never be equipped.
    pub fn stackable(stack_size: u32) -> Self {
        Self {
            stack_size: stack_size.max(1),
            max_subtype_quantity: None,
            max_type_quantity: None,
            can_equip: false,
            max_equipped: 0,
            min_equipped: 0,
            can_force_unequip: false,
            force_equip_on_add: false,
            can_delete: true,
            equip_action: EquipAction::None,
        }
    }

    /// Non-stackable wearable with up to `max_equipped` active at once.
    pub fn equippable(max_equipped: u32) -> Self {
        Self {
            stack_size: 1,
            can_equip: true,
            max_equipped,
            can_force_unequip: true,
            ..Self::stackable(1)
        }
    }

    pub fn is_stackable(&self) -> bool {
        self.stack_size > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stackable_never_has_zero_stack_size() {
        assert_eq!(ItemPolicy::stackable(0).stack_size, 1);
        assert!(!ItemPolicy::stackable(1).is_stackable());
        assert!(ItemPolicy::stackable(99).is_stackable());
    }

    #[test]
    fn equippable_defaults() {
        let policy = ItemPolicy::equippable(2);
        assert!(policy.can_equip);
        assert!(policy.can_force_unequip);
        assert_eq!(policy.max_equipped, 2);
        assert_eq!(policy.stack_size, 1);
        assert_eq!(policy.equip_action, EquipAction::None);
    }
}
