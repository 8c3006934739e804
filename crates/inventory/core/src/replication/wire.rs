//! Messages exchanged between an authority and its replicas.
//!
//! Items and change records travel as positional tuples; everything is
//! encoded with bincode, so field order is the wire order.

use core::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::ProtocolError;
use crate::change::{ChangeAction, ChangeRecord};
use crate::container::{ContainerSnapshot, StateDigest};
use crate::identity::{ItemId, OwnerId};
use crate::item::{Attributes, Item, ItemKind, Subkind};

/// Identifies one full-state transfer. Strictly increasing per replica.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TransferId(pub u64);

impl TransferId {
    pub const fn next(self) -> Self {
        TransferId(self.0 + 1)
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transfer#{}", self.0)
    }
}

/// `[id, kind, subkind, quantity, attributes]`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ItemTuple(
    pub ItemId,
    pub ItemKind,
    pub Subkind,
    pub u32,
    pub Attributes,
);

impl ItemTuple {
    pub fn id(&self) -> ItemId {
        self.0
    }
}

impl From<&Item> for ItemTuple {
    fn from(item: &Item) -> Self {
        ItemTuple(
            item.id,
            item.kind,
            item.subkind,
            item.quantity,
            item.attributes.clone(),
        )
    }
}

impl From<ItemTuple> for Item {
    fn from(ItemTuple(id, kind, subkind, quantity, attributes): ItemTuple) -> Self {
        Item {
            attributes,
            ..Item::with_id(id, kind, subkind, quantity)
        }
    }
}

/// `[action_code, item_tuple]`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChangeTuple(pub u8, pub ItemTuple);

impl From<&ChangeRecord> for ChangeTuple {
    fn from(record: &ChangeRecord) -> Self {
        ChangeTuple(record.action().code(), ItemTuple::from(record.item()))
    }
}

impl TryFrom<ChangeTuple> for ChangeRecord {
    type Error = ProtocolError;

    fn try_from(ChangeTuple(code, item): ChangeTuple) -> Result<Self, Self::Error> {
        let action = ChangeAction::from_code(code).ok_or(ProtocolError::UnknownAction { code })?;
        Ok(ChangeRecord::new(action, item.into()))
    }
}

/// One batch of authority changes and the digest after applying them.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeltaPush {
    pub owner: OwnerId,
    pub records: Vec<ChangeTuple>,
    pub digest: StateDigest,
}

impl DeltaPush {
    pub fn new(owner: OwnerId, records: &[ChangeRecord], digest: StateDigest) -> Self {
        Self {
            owner,
            records: records.iter().map(ChangeTuple::from).collect(),
            digest,
        }
    }

    pub fn decode_records(&self) -> Result<Vec<ChangeRecord>, ProtocolError> {
        self.records
            .iter()
            .cloned()
            .map(ChangeRecord::try_from)
            .collect()
    }
}

/// One chunk of a bincode-encoded [`ContainerSnapshot`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FullStateSegment {
    pub owner: OwnerId,
    pub transfer: TransferId,
    /// 1-based.
    pub segment_index: u32,
    /// Constant across a transfer.
    pub segment_count: u32,
    pub payload: Vec<u8>,
}

/// Authority to replica.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Downstream {
    Delta(DeltaPush),
    Segment(FullStateSegment),
    /// The container was destroyed; no further traffic follows.
    Closed { owner: OwnerId },
}

impl Downstream {
    pub fn owner(&self) -> OwnerId {
        match self {
            Downstream::Delta(push) => push.owner,
            Downstream::Segment(segment) => segment.owner,
            Downstream::Closed { owner } => *owner,
        }
    }
}

/// Replica (or remote actor) to authority.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Upstream {
    Resync { owner: OwnerId, transfer: TransferId },
    Request(RemoteRequest),
}

impl Upstream {
    pub fn class(&self) -> RequestClass {
        match self {
            Upstream::Resync { .. } => RequestClass::Resync,
            Upstream::Request(request) => request.kind.class(),
        }
    }
}

/// Mutation or fetch request from a remote actor. The actor itself is
/// implied by the transport session.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RemoteRequest {
    /// Container the request targets.
    pub owner: OwnerId,
    pub kind: RequestKind,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RequestKind {
    /// Move the item from the actor's personal container into `owner`'s.
    AddItem(ItemTuple),
    /// Move the item from `owner`'s container into the actor's personal one.
    TakeItem(ItemTuple),
    /// Manual delete from `owner`'s container.
    DeleteItem(ItemTuple),
    /// Full-state transfer of `owner`'s container to the actor.
    FetchInventory,
}

/// Rate-limit bucket of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestClass {
    Mutation,
    Query,
    /// Replica-initiated full-state transfer.
    Resync,
}

impl RequestKind {
    pub fn class(&self) -> RequestClass {
        match self {
            RequestKind::FetchInventory => RequestClass::Query,
            _ => RequestClass::Mutation,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::AddItem(_) => "add_item",
            RequestKind::TakeItem(_) => "take_item",
            RequestKind::DeleteItem(_) => "delete_item",
            RequestKind::FetchInventory => "fetch_inventory",
        }
    }
}

pub fn encode_snapshot(snapshot: &ContainerSnapshot) -> Result<Vec<u8>, ProtocolError> {
    encode(snapshot)
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<ContainerSnapshot, ProtocolError> {
    decode(bytes)
}

/// Encodes any wire message.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    bincode::serialize(message).map_err(ProtocolError::malformed)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    bincode::deserialize(bytes).map_err(ProtocolError::malformed)
}
