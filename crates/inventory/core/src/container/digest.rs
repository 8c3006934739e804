//! Whole-state digest compared by replicas.
//!
//! SHA-256 over a canonical, length-prefixed encoding of the container kind,
//! every item in list order, and the equipped ids in equip order. Any field
//! that affects an invariant changes the digest; the local owner
//! back-reference does not.

use core::fmt;

use sha2::{Digest, Sha256};

use crate::config::InventoryConfig;
use crate::identity::ItemId;
use crate::item::{AttributeValue, ContainerKind, Item};

const DOMAIN_TAG: &[u8] = b"inventory-state/v1";

/// SHA-256 digest of a container's replicated state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StateDigest([u8; InventoryConfig::DIGEST_LEN]);

impl StateDigest {
    pub const fn from_bytes(bytes: [u8; InventoryConfig::DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; InventoryConfig::DIGEST_LEN] {
        &self.0
    }

    /// First 8 bytes as hex, for compact logging.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }

    /// Computes the digest of a container state.
    pub fn compute(kind: ContainerKind, items: &[Item], equipped: &[ItemId]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(DOMAIN_TAG);
        hasher.update([kind.code()]);

        hasher.update((items.len() as u64).to_le_bytes());
        for item in items {
            hash_item(&mut hasher, item);
        }

        hasher.update((equipped.len() as u64).to_le_bytes());
        for id in equipped {
            hasher.update(id.as_bytes());
        }

        Self(hasher.finalize().into())
    }
}

fn hash_item(hasher: &mut Sha256, item: &Item) {
    hasher.update(item.id.as_bytes());
    hasher.update([item.kind.code()]);
    hasher.update(item.subkind.0.to_le_bytes());
    hasher.update(item.quantity.to_le_bytes());

    hasher.update((item.attributes.len() as u64).to_le_bytes());
    for (key, value) in &item.attributes {
        hash_bytes(hasher, key.as_bytes());
        hasher.update([value.tag()]);
        match value {
            AttributeValue::Flag(flag) => hasher.update([u8::from(*flag)]),
            AttributeValue::Int(int) => hasher.update(int.to_le_bytes()),
            AttributeValue::Text(text) => hash_bytes(hasher, text.as_bytes()),
        }
    }
}

fn hash_bytes(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

impl fmt::Debug for StateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateDigest({})", self.short())
    }
}

impl fmt::Display for StateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
