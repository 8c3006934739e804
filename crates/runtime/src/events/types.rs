//! Event types for each topic.

use inventory_core::{
    AccessLevel, ActorId, ChangeRecord, ContainerError, OwnerId, ResyncReason, StateDigest, TransferId,
};

use super::Topic;

/// Why a remote request was dropped before reaching a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    RateLimited,
    AccessDenied,
    /// The request names the actor's own container as both ends of a move.
    InvalidTarget,
    /// The target container could not be loaded.
    Unavailable,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::RateLimited => "rate_limited",
            DropReason::AccessDenied => "access_denied",
            DropReason::InvalidTarget => "invalid_target",
            DropReason::Unavailable => "unavailable",
        }
    }
}

/// Authority-side events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryEvent {
    /// A mutation batch was committed and pushed to subscribers.
    Changed {
        owner: OwnerId,
        revision: u64,
        digest: StateDigest,
        records: Vec<ChangeRecord>,
    },

    /// A mutation failed validation; the container is unchanged.
    Rejected {
        owner: OwnerId,
        operation: &'static str,
        error: ContainerError,
    },

    /// A remote request was dropped without an answer.
    RequestDropped {
        actor: ActorId,
        owner: OwnerId,
        request: &'static str,
        reason: DropReason,
    },

    /// A full-state transfer was sent to a replica.
    TransferServed {
        actor: ActorId,
        owner: OwnerId,
        transfer: TransferId,
        segments: usize,
    },

    /// A container was destroyed and its subscribers told so.
    Destroyed { owner: OwnerId },

    /// An actor's grant on `owner` changed. `level` is `None` after a revoke.
    AccessChanged {
        owner: OwnerId,
        actor: ActorId,
        level: Option<AccessLevel>,
    },
}

impl InventoryEvent {
    pub fn topic(&self) -> Topic {
        match self {
            InventoryEvent::Changed { .. } | InventoryEvent::Destroyed { .. } => Topic::Changes,
            InventoryEvent::Rejected { .. } | InventoryEvent::RequestDropped { .. } => {
                Topic::Requests
            }
            InventoryEvent::TransferServed { .. } => Topic::Transfers,
            InventoryEvent::AccessChanged { .. } => Topic::Access,
        }
    }

    pub fn owner(&self) -> OwnerId {
        match self {
            InventoryEvent::Changed { owner, .. }
            | InventoryEvent::Rejected { owner, .. }
            | InventoryEvent::RequestDropped { owner, .. }
            | InventoryEvent::TransferServed { owner, .. }
            | InventoryEvent::AccessChanged { owner, .. }
            | InventoryEvent::Destroyed { owner } => *owner,
        }
    }
}

/// Replica-side events, published per replica session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaEvent {
    /// The replica applied a delta or installed a transfer and matches the
    /// authority's digest.
    Synced { owner: OwnerId, digest: StateDigest },

    /// The replica diverged and asked for `transfer`.
    Resyncing {
        owner: OwnerId,
        transfer: TransferId,
        reason: ResyncReason,
    },

    /// The authority destroyed the container.
    Closed { owner: OwnerId },
}
