//! Inventory rules and replication protocol.
//!
//! `inventory-core` defines the item data model, the behavior tables that
//! decide which mutations are legal, and the delta replication protocol that
//! keeps replicas consistent with an authoritative container. Everything here
//! is synchronous and free of I/O; all container mutation flows through
//! [`Container`], and the runtime crate hosts these types on async workers.
pub mod access;
pub mod change;
pub mod config;
pub mod container;
pub mod error;
pub mod identity;
pub mod item;
pub mod policy;
pub mod replication;
pub mod seed;

pub use access::{AccessController, AccessDenied, AccessLevel};
pub use change::{ChangeAction, ChangeRecord};
pub use config::InventoryConfig;
pub use container::{
    Container, ContainerError, ContainerSnapshot, DerivedIndex, StateDigest, Violation,
};
pub use error::{ErrorSeverity, InventoryError};
pub use identity::{ActorId, ItemId, OwnerId};
pub use item::{AttributeValue, Attributes, ContainerKind, Item, ItemKind, ItemQuery, Subkind};
pub use policy::{
    BehaviorTables, BehaviorTablesBuilder, ContainerPolicy, EquipAction, EquipBehavior,
    EquipBehaviors, ItemPolicy, NoEffect, PolicyError, TimedBooster,
};
pub use replication::{
    AuthorityEndpoint, ChangeTuple, DeltaPush, Downstream, FullStateSegment, ItemTuple,
    ProtocolError, Publication, RemoteRequest, ReplicaEndpoint, ReplicaOutcome, ReplicaState,
    RequestClass, RequestKind, ResyncReason, TransferId, Upstream,
};
pub use seed::{DefaultInventories, SeedItem};
