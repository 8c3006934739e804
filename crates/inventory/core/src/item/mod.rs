//! Item types.
//!
//! This module contains the foundational item types:
//! - [`Item`]: a single inventory entry
//! - [`ItemKind`] / [`Subkind`]: the tags that select policies
//! - [`Attributes`]: the open-ended key/value bag carried by each item

mod attributes;
mod kind;

pub use attributes::{AttributeValue, Attributes};
pub use kind::{ContainerKind, ItemKind, ItemQuery, Subkind};

use crate::identity::{ItemId, OwnerId};

/// A single inventory entry.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub subkind: Subkind,
    pub quantity: u32,
    pub attributes: Attributes,

    /// Container currently holding this item. Maintained by the container,
    /// never replicated and never part of the digest.
    #[serde(skip)]
    pub owner: Option<OwnerId>,
}

impl Item {
    /// Creates a new item with a freshly generated id.
    pub fn new(kind: ItemKind, subkind: Subkind, quantity: u32) -> Self {
        Self::with_id(ItemId::generate(), kind, subkind, quantity)
    }

    pub fn with_id(id: ItemId, kind: ItemKind, subkind: Subkind, quantity: u32) -> Self {
        Self {
            id,
            kind,
            subkind,
            quantity,
            attributes: Attributes::new(),
            owner: None,
        }
    }

    /// Sets an attribute (builder pattern).
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// True when both entries describe the same stackable goods.
    ///
    /// Identity and quantity are ignored; kind, subkind, and every attribute
    /// must match.
    pub fn stacks_with(&self, other: &Item) -> bool {
        self.kind == other.kind
            && self.subkind == other.subkind
            && self.attributes == other.attributes
    }

    pub fn matches(&self, query: ItemQuery) -> bool {
        match query {
            ItemQuery::Kind(kind) => self.kind == kind,
            ItemQuery::Subkind(kind, subkind) => self.kind == kind && self.subkind == subkind,
        }
    }
}
