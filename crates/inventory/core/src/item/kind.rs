//! Closed kind enumerations that select policies.

use strum::{Display, EnumIter};

/// Item family. Selects an [`crate::ItemPolicy`] and the equip behavior.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    Display,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum ItemKind {
    Clothing,
    Accessory,
    /// Name plate shown above the owner; exactly one is worn at all times.
    Nametag,
    /// Time-limited boost activated on equip.
    Booster,
    Consumable,
    Currency,
    Furniture,
    Collectible,
    QuestToken,
}

impl ItemKind {
    /// Stable numeric code used by the digest and diagnostics.
    ///
    /// Codes are append-only: never renumber an existing kind.
    pub const fn code(&self) -> u8 {
        match self {
            ItemKind::Clothing => 1,
            ItemKind::Accessory => 2,
            ItemKind::Nametag => 3,
            ItemKind::Booster => 4,
            ItemKind::Consumable => 5,
            ItemKind::Currency => 6,
            ItemKind::Furniture => 7,
            ItemKind::Collectible => 8,
            ItemKind::QuestToken => 9,
        }
    }
}

/// Container kind. Selects a [`crate::ContainerPolicy`].
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    Display,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum ContainerKind {
    /// A player's general-purpose bag.
    PlayerInventory,
    /// Wearables only; the place where clothing gets equipped.
    Wardrobe,
    /// Storage attached to a world object, shared through access grants.
    SharedChest,
    /// Delivery box filled by the system; items can only be taken out.
    Mailbox,
}

impl ContainerKind {
    pub const fn code(&self) -> u8 {
        match self {
            ContainerKind::PlayerInventory => 1,
            ContainerKind::Wardrobe => 2,
            ContainerKind::SharedChest => 3,
            ContainerKind::Mailbox => 4,
        }
    }
}

/// Refinement of an [`ItemKind`] (a specific shirt model, a booster flavor).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Subkind(pub u16);

/// Selector accepted by [`crate::Container::find_items`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemQuery {
    /// Every item of a kind, regardless of subkind.
    Kind(ItemKind),
    /// Items of one kind and subkind.
    Subkind(ItemKind, Subkind),
}

impl From<ItemKind> for ItemQuery {
    fn from(kind: ItemKind) -> Self {
        ItemQuery::Kind(kind)
    }
}

impl From<(ItemKind, Subkind)> for ItemQuery {
    fn from((kind, subkind): (ItemKind, Subkind)) -> Self {
        ItemQuery::Subkind(kind, subkind)
    }
}
