//! Authority side of the replication protocol.

use std::collections::BTreeMap;

use super::wire::{DeltaPush, FullStateSegment, TransferId, encode_snapshot};
use super::ProtocolError;
use crate::access::AccessController;
use crate::change::ChangeRecord;
use crate::config::InventoryConfig;
use crate::container::{Container, StateDigest};
use crate::identity::{ActorId, OwnerId};

/// Result of publishing one batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Publication {
    pub pushes: Vec<(ActorId, DeltaPush)>,
    /// Subscribers skipped for lacking view access.
    pub suppressed: Vec<ActorId>,
}

/// Per-container subscriber table and transfer bookkeeping.
#[derive(Clone, Debug)]
pub struct AuthorityEndpoint {
    owner: OwnerId,
    max_segment_bytes: usize,
    /// Subscriber -> last transfer served to it.
    subscribers: BTreeMap<ActorId, Option<TransferId>>,
}

impl AuthorityEndpoint {
    pub fn new(owner: OwnerId, config: &InventoryConfig) -> Self {
        Self {
            owner,
            max_segment_bytes: config.max_segment_bytes.max(1),
            subscribers: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Returns `true` if the actor was not subscribed yet.
    pub fn subscribe(&mut self, actor: ActorId) -> bool {
        if self.subscribers.contains_key(&actor) {
            return false;
        }
        self.subscribers.insert(actor, None);
        true
    }

    pub fn unsubscribe(&mut self, actor: ActorId) -> bool {
        self.subscribers.remove(&actor).is_some()
    }

    pub fn is_subscribed(&self, actor: ActorId) -> bool {
        self.subscribers.contains_key(&actor)
    }

    pub fn subscribers(&self) -> Vec<ActorId> {
        self.subscribers.keys().copied().collect()
    }

    /// Builds the delta pushes for one committed batch.
    ///
    /// Only subscribers that can currently view the container receive it.
    pub fn publish(
        &self,
        records: &[ChangeRecord],
        digest: StateDigest,
        access: &AccessController,
    ) -> Publication {
        let mut publication = Publication::default();
        if records.is_empty() {
            return publication;
        }

        let push = DeltaPush::new(self.owner, records, digest);
        for &actor in self.subscribers.keys() {
            if access.can_view(actor) {
                publication.pushes.push((actor, push.clone()));
            } else {
                publication.suppressed.push(actor);
            }
        }
        publication
    }

    /// Claims a transfer id for `actor`.
    ///
    /// `Some(id)` is a replica resync request: ids at or below the last one
    /// served to that actor are duplicates and yield `None`. `None` is an
    /// authority-initiated transfer (fetch) and takes the next free id.
    /// Claiming a transfer subscribes the actor.
    pub fn begin_transfer(
        &mut self,
        actor: ActorId,
        requested: Option<TransferId>,
    ) -> Option<TransferId> {
        let last = self.subscribers.get(&actor).copied().flatten();
        let transfer = match (requested, last) {
            (Some(requested), Some(last)) if requested <= last => return None,
            (Some(requested), _) => requested,
            (None, Some(last)) => last.next(),
            (None, None) => TransferId(1),
        };
        self.subscribers.insert(actor, Some(transfer));
        Some(transfer)
    }

    /// Splits the container's state into ordered segments for `transfer`.
    pub fn full_state_transfer(
        &self,
        container: &Container,
        transfer: TransferId,
    ) -> Result<Vec<FullStateSegment>, ProtocolError> {
        segment_snapshot(
            self.owner,
            &encode_snapshot(&container.snapshot())?,
            transfer,
            self.max_segment_bytes,
        )
    }
}

/// Chunks an encoded snapshot into at least one segment.
pub fn segment_snapshot(
    owner: OwnerId,
    encoded: &[u8],
    transfer: TransferId,
    max_segment_bytes: usize,
) -> Result<Vec<FullStateSegment>, ProtocolError> {
    let chunks: Vec<&[u8]> = if encoded.is_empty() {
        vec![encoded]
    } else {
        encoded.chunks(max_segment_bytes.max(1)).collect()
    };
    let segment_count = u32::try_from(chunks.len()).map_err(|_| {
        ProtocolError::MalformedPayload(format!("{} segments exceed u32", chunks.len()))
    })?;

    Ok(chunks
        .into_iter()
        .zip(InventoryConfig::FIRST_SEGMENT..)
        .map(|(chunk, segment_index)| FullStateSegment {
            owner,
            transfer,
            segment_index,
            segment_count,
            payload: chunk.to_vec(),
        })
        .collect())
}
