use crate::item::ItemKind;

/// Limits and permissions for one [`crate::ContainerKind`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContainerPolicy {
    /// Maximum number of entries (stacks count once).
    pub max_size: usize,
    /// Allow-list of item kinds. Empty accepts every kind.
    #[serde(default)]
    pub type_filter: Vec<ItemKind>,
    pub can_add: bool,
    /// Gates manual deletes only; system removals bypass it.
    pub can_delete: bool,
    pub can_equip: bool,
    pub can_swap_in: bool,
    pub can_swap_out: bool,
    /// Allows transfers between two containers of this same kind.
    pub can_swap_between_same_kind: bool,
}

impl ContainerPolicy {
    /// A container that allows every operation except same-kind swaps.
    pub fn permissive(max_size: usize) -> Self {
        Self {
            max_size,
            type_filter: Vec::new(),
            can_add: true,
            can_delete: true,
            can_equip: true,
            can_swap_in: true,
            can_swap_out: true,
            can_swap_between_same_kind: false,
        }
    }

    #[must_use]
    pub fn with_type_filter(mut self, kinds: impl IntoIterator<Item = ItemKind>) -> Self {
        self.type_filter = kinds.into_iter().collect();
        self
    }

    pub fn accepts(&self, kind: ItemKind) -> bool {
        self.type_filter.is_empty() || self.type_filter.contains(&kind)
    }
}
