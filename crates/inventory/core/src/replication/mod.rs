//! Delta replication between an authoritative container and its replicas.
//!
//! The authority pushes each committed batch with the digest it produced.
//! Replicas apply the batch, recompute the digest, and fall back to a
//! segmented full-state transfer whenever the two disagree.
mod authority;
mod error;
mod replica;
mod wire;

pub use authority::{AuthorityEndpoint, Publication, segment_snapshot};
pub use error::ProtocolError;
pub use replica::{ReplicaEndpoint, ReplicaOutcome, ReplicaState, ResyncReason};
pub use wire::{
    ChangeTuple, DeltaPush, Downstream, FullStateSegment, ItemTuple, RemoteRequest, RequestClass,
    RequestKind, TransferId, Upstream, decode, decode_snapshot, encode, encode_snapshot,
};
