//! Identity types: items, container owners, and transport actors.

use core::fmt;

use uuid::Uuid;

/// Globally unique 128-bit item identity.
///
/// Generated once when an item is created and never reused; merging a stack
/// retires the incoming id rather than recycling it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Generates a fresh random (v4) identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Builds an identifier from a raw 128-bit value (fixtures, decoding).
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Builds an identifier from its 16-byte big-endian form.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Returns the 16-byte big-endian form used by the digest.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    pub fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Owner of a container: a player or a shared world object.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct OwnerId(pub u64);

/// Remote party identified by its transport session.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ActorId(pub u64);

impl From<ActorId> for OwnerId {
    /// An actor's personal container is keyed by the actor's own id.
    fn from(actor: ActorId) -> Self {
        OwnerId(actor.0)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = ItemId::generate();
        let b = ItemId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn byte_form_round_trips() {
        let id = ItemId::from_u128(0x0102_0304_0506_0708_090a_0b0c_0d0e_0f10);
        assert_eq!(id.as_bytes()[0], 0x01);
        assert_eq!(id.as_bytes()[15], 0x10);
        assert_eq!(ItemId::from_bytes(*id.as_bytes()), id);
    }

    #[test]
    fn bincode_encoding_is_sixteen_bytes() {
        let id = ItemId::generate();
        let bytes = bincode::serialize(&id).unwrap();
        // uuid serializes as a length-prefixed byte slice in binary formats
        assert!(bytes.ends_with(id.as_bytes()));
        let decoded: ItemId = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, id);
    }

    #[test]
    fn actor_maps_to_personal_owner() {
        assert_eq!(OwnerId::from(ActorId(7)), OwnerId(7));
    }
}
