//! Replica side of the replication protocol.
//!
//! The replica applies deltas in receipt order and recomputes the digest
//! itself after every batch. A mismatch, a record that cannot be applied, or
//! any protocol error drops the replica into `AwaitingFullResync` with a
//! fresh transfer id; segments belonging to any older transfer are ignored
//! from then on.

use std::sync::Arc;

use tracing::{info, warn};

use super::wire::{DeltaPush, FullStateSegment, TransferId, Upstream, decode_snapshot};
use super::ProtocolError;
use crate::config::InventoryConfig;
use crate::container::{Container, ContainerError, StateDigest};
use crate::identity::OwnerId;
use crate::item::ContainerKind;
use crate::policy::BehaviorTables;

/// Where a replica stands in the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplicaState {
    Synced,
    AwaitingFullResync {
        transfer: TransferId,
    },
    ReceivingSegments {
        transfer: TransferId,
        received: u32,
        count: u32,
    },
}

impl ReplicaState {
    /// Transfer the replica is currently waiting on, if any.
    pub fn transfer(&self) -> Option<TransferId> {
        match self {
            ReplicaState::Synced => None,
            ReplicaState::AwaitingFullResync { transfer }
            | ReplicaState::ReceivingSegments { transfer, .. } => Some(*transfer),
        }
    }
}

/// Why a replica asked for a full-state transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResyncReason {
    /// The replica has never been synced.
    Initial,
    DigestMismatch {
        expected: StateDigest,
        actual: StateDigest,
    },
    /// A delta record could not be applied locally.
    ApplyFailed(ContainerError),
    Protocol(ProtocolError),
    /// The transferred state was rejected by the container.
    InvalidState(ContainerError),
}

impl ResyncReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResyncReason::Initial => "initial",
            ResyncReason::DigestMismatch { .. } => "digest_mismatch",
            ResyncReason::ApplyFailed(_) => "apply_failed",
            ResyncReason::Protocol(_) => "protocol_error",
            ResyncReason::InvalidState(_) => "invalid_state",
        }
    }
}

/// What handling one message did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplicaOutcome {
    /// A delta was applied and the digests match.
    Applied,
    /// A full-state transfer completed and replaced local state.
    Installed,
    /// A segment was accepted; more are expected.
    Buffered { received: u32, count: u32 },
    /// Stale or out-of-state traffic was dropped.
    Ignored,
    /// The replica diverged; send `Upstream::Resync` for `transfer`.
    ResyncRequested {
        transfer: TransferId,
        reason: ResyncReason,
    },
}

/// Local copy of one authoritative container.
#[derive(Debug)]
pub struct ReplicaEndpoint {
    owner: OwnerId,
    container: Container,
    state: ReplicaState,
    /// Highest transfer id used or adopted so far.
    latest: TransferId,
    buffer: Vec<u8>,
}

impl ReplicaEndpoint {
    /// Creates an unsynced replica and the resync request that starts it.
    pub fn new(
        owner: OwnerId,
        kind: ContainerKind,
        tables: Arc<BehaviorTables>,
    ) -> Result<(Self, Upstream), ContainerError> {
        let transfer = TransferId(1);
        let replica = Self {
            owner,
            container: Container::new(owner, kind, tables)?,
            state: ReplicaState::AwaitingFullResync { transfer },
            latest: transfer,
            buffer: Vec::new(),
        };
        let request = Upstream::Resync { owner, transfer };
        Ok((replica, request))
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn state(&self) -> ReplicaState {
        self.state
    }

    pub fn is_synced(&self) -> bool {
        self.state == ReplicaState::Synced
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn digest(&self) -> StateDigest {
        self.container.digest()
    }

    /// The resync message to (re)send while a transfer is outstanding.
    pub fn resync_request(&self) -> Option<Upstream> {
        self.state.transfer().map(|transfer| Upstream::Resync {
            owner: self.owner,
            transfer,
        })
    }

    pub fn handle_delta(&mut self, push: &DeltaPush) -> ReplicaOutcome {
        if push.owner != self.owner {
            return self.ignore_foreign(push.owner);
        }

        match self.state {
            ReplicaState::Synced => {}
            // Already covered by the state the pending transfer will carry.
            ReplicaState::AwaitingFullResync { .. } => return ReplicaOutcome::Ignored,
            ReplicaState::ReceivingSegments { transfer, .. } => {
                return self.request_resync(ResyncReason::Protocol(
                    ProtocolError::DeltaDuringTransfer { transfer },
                ));
            }
        }

        let records = match push.decode_records() {
            Ok(records) => records,
            Err(error) => return self.request_resync(ResyncReason::Protocol(error)),
        };
        if let Err(error) = self.container.apply_changes(&records) {
            return self.request_resync(ResyncReason::ApplyFailed(error));
        }

        let actual = self.container.digest();
        if actual != push.digest {
            return self.request_resync(ResyncReason::DigestMismatch {
                expected: push.digest,
                actual,
            });
        }
        ReplicaOutcome::Applied
    }

    pub fn handle_segment(&mut self, segment: FullStateSegment) -> ReplicaOutcome {
        if segment.owner != self.owner {
            return self.ignore_foreign(segment.owner);
        }
        if segment.transfer < self.latest {
            return ReplicaOutcome::Ignored;
        }
        if segment.transfer > self.latest {
            // Authority-initiated transfer, or one superseding ours. Only a
            // first segment can start it.
            if segment.segment_index != InventoryConfig::FIRST_SEGMENT {
                return ReplicaOutcome::Ignored;
            }
            self.latest = segment.transfer;
            self.state = ReplicaState::AwaitingFullResync {
                transfer: segment.transfer,
            };
            self.buffer.clear();
        }

        match self.state {
            // Our transfer already completed; a late duplicate.
            ReplicaState::Synced => ReplicaOutcome::Ignored,
            ReplicaState::AwaitingFullResync { transfer } => {
                if segment.segment_count == 0 || segment.segment_index > segment.segment_count {
                    return self.request_resync(ResyncReason::Protocol(
                        ProtocolError::SegmentIndexInvalid {
                            index: segment.segment_index,
                            count: segment.segment_count,
                        },
                    ));
                }
                if segment.segment_index != InventoryConfig::FIRST_SEGMENT {
                    return self.request_resync(ResyncReason::Protocol(
                        ProtocolError::SegmentOutOfOrder {
                            transfer,
                            expected: InventoryConfig::FIRST_SEGMENT,
                            received: segment.segment_index,
                        },
                    ));
                }
                self.buffer = segment.payload;
                self.advance(transfer, 1, segment.segment_count)
            }
            ReplicaState::ReceivingSegments {
                transfer,
                received,
                count,
            } => {
                if segment.segment_count != count {
                    return self.request_resync(ResyncReason::Protocol(
                        ProtocolError::SegmentCountMismatch {
                            transfer,
                            expected: count,
                            received: segment.segment_count,
                        },
                    ));
                }
                if segment.segment_index != received + 1 {
                    return self.request_resync(ResyncReason::Protocol(
                        ProtocolError::SegmentOutOfOrder {
                            transfer,
                            expected: received + 1,
                            received: segment.segment_index,
                        },
                    ));
                }
                self.buffer.extend_from_slice(&segment.payload);
                self.advance(transfer, received + 1, count)
            }
        }
    }

    /// Abandons any in-flight transfer and starts a new one.
    pub fn request_resync(&mut self, reason: ResyncReason) -> ReplicaOutcome {
        let transfer = self.latest.next();
        self.latest = transfer;
        self.state = ReplicaState::AwaitingFullResync { transfer };
        self.buffer.clear();

        warn!(
            target: "inventory::replica",
            owner = %self.owner,
            %transfer,
            reason = reason.as_str(),
            detail = ?reason,
            "Replica requesting full resync"
        );
        ReplicaOutcome::ResyncRequested { transfer, reason }
    }

    fn advance(&mut self, transfer: TransferId, received: u32, count: u32) -> ReplicaOutcome {
        if received < count {
            self.state = ReplicaState::ReceivingSegments {
                transfer,
                received,
                count,
            };
            return ReplicaOutcome::Buffered { received, count };
        }
        self.install(transfer)
    }

    fn install(&mut self, transfer: TransferId) -> ReplicaOutcome {
        let payload = std::mem::take(&mut self.buffer);
        let snapshot = match decode_snapshot(&payload) {
            Ok(snapshot) => snapshot,
            Err(error) => return self.request_resync(ResyncReason::Protocol(error)),
        };
        if snapshot.owner != self.owner {
            return self.request_resync(ResyncReason::Protocol(ProtocolError::OwnerMismatch {
                expected: self.owner,
                received: snapshot.owner,
            }));
        }
        if let Err(error) = self.container.replace_with(snapshot) {
            return self.request_resync(ResyncReason::InvalidState(error));
        }

        self.state = ReplicaState::Synced;
        info!(
            target: "inventory::replica",
            owner = %self.owner,
            %transfer,
            items = self.container.item_count(),
            digest = %self.container.digest().short(),
            "Full-state transfer installed"
        );
        ReplicaOutcome::Installed
    }

    fn ignore_foreign(&self, received: OwnerId) -> ReplicaOutcome {
        warn!(
            target: "inventory::replica",
            owner = %self.owner,
            %received,
            "Dropping traffic addressed to another container"
        );
        ReplicaOutcome::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{ChangeAction, ChangeRecord};
    use crate::identity::ItemId;
    use crate::item::{Item, ItemKind, Subkind};
    use crate::replication::authority::AuthorityEndpoint;

    fn tables() -> Arc<BehaviorTables> {
        Arc::new(BehaviorTables::standard())
    }

    fn authority_with_items(count: u128) -> Container {
        let mut container =
            Container::new(OwnerId(1), ContainerKind::PlayerInventory, tables()).unwrap();
        for raw in 0..count {
            container
                .add_item(
                    Item::with_id(ItemId::from_u128(raw + 1), ItemKind::Clothing, Subkind(1), 1)
                        .with_attribute("note", "padding to spread the payload"),
                )
                .unwrap();
        }
        container.drain_changes();
        container
    }

    /// Segments sized so the authority's state spans exactly three.
    fn three_segments(container: &Container, transfer: TransferId) -> Vec<FullStateSegment> {
        let encoded = crate::replication::wire::encode_snapshot(&container.snapshot()).unwrap();
        let size = encoded.len().div_ceil(3);
        let segments =
            crate::replication::authority::segment_snapshot(OwnerId(1), &encoded, transfer, size)
                .unwrap();
        assert_eq!(segments.len(), 3);
        segments
    }

    fn new_replica() -> ReplicaEndpoint {
        let (replica, request) =
            ReplicaEndpoint::new(OwnerId(1), ContainerKind::PlayerInventory, tables()).unwrap();
        assert_eq!(
            request,
            Upstream::Resync {
                owner: OwnerId(1),
                transfer: TransferId(1)
            }
        );
        replica
    }

    #[test]
    fn in_order_segments_install_and_sync() {
        let authority = authority_with_items(6);
        let mut replica = new_replica();
        let mut segments = three_segments(&authority, TransferId(1)).into_iter();

        assert_eq!(
            replica.handle_segment(segments.next().unwrap()),
            ReplicaOutcome::Buffered {
                received: 1,
                count: 3
            }
        );
        assert_eq!(
            replica.state(),
            ReplicaState::ReceivingSegments {
                transfer: TransferId(1),
                received: 1,
                count: 3
            }
        );
        assert_eq!(
            replica.handle_segment(segments.next().unwrap()),
            ReplicaOutcome::Buffered {
                received: 2,
                count: 3
            }
        );
        assert_eq!(
            replica.handle_segment(segments.next().unwrap()),
            ReplicaOutcome::Installed
        );
        assert!(replica.is_synced());
        assert_eq!(replica.digest(), authority.digest());
        assert_eq!(replica.resync_request(), None);
    }

    #[test]
    fn skipped_segment_restarts_from_one() {
        let authority = authority_with_items(6);
        let mut replica = new_replica();
        let first = three_segments(&authority, TransferId(1));

        replica.handle_segment(first[0].clone());
        let outcome = replica.handle_segment(first[2].clone());
        assert!(matches!(
            outcome,
            ReplicaOutcome::ResyncRequested {
                transfer: TransferId(2),
                reason: ResyncReason::Protocol(ProtocolError::SegmentOutOfOrder {
                    expected: 2,
                    received: 3,
                    ..
                })
            }
        ));
        assert_eq!(
            replica.state(),
            ReplicaState::AwaitingFullResync {
                transfer: TransferId(2)
            }
        );

        // Late traffic from the abandoned transfer is never merged.
        assert_eq!(replica.handle_segment(first[1].clone()), ReplicaOutcome::Ignored);

        let second = three_segments(&authority, TransferId(2));
        for segment in second {
            replica.handle_segment(segment);
        }
        assert!(replica.is_synced());
        assert_eq!(replica.digest(), authority.digest());
    }

    #[test]
    fn mismatched_segment_count_is_a_protocol_error() {
        let authority = authority_with_items(6);
        let mut replica = new_replica();
        let mut segments = three_segments(&authority, TransferId(1));
        replica.handle_segment(segments[0].clone());

        segments[1].segment_count = 4;
        assert!(matches!(
            replica.handle_segment(segments[1].clone()),
            ReplicaOutcome::ResyncRequested {
                reason: ResyncReason::Protocol(ProtocolError::SegmentCountMismatch { .. }),
                ..
            }
        ));
    }

    #[test]
    fn deltas_apply_and_digest_mismatch_triggers_resync() {
        let mut authority = authority_with_items(2);
        let mut replica = new_replica();
        let segments = AuthorityEndpoint::new(OwnerId(1), &InventoryConfig::default())
            .full_state_transfer(&authority, TransferId(1))
            .unwrap();
        for segment in segments {
            replica.handle_segment(segment);
        }
        assert!(replica.is_synced());

        authority.equip_item(ItemId::from_u128(1)).unwrap();
        let push = DeltaPush::new(OwnerId(1), &authority.drain_changes(), authority.digest());
        assert_eq!(replica.handle_delta(&push), ReplicaOutcome::Applied);
        assert_eq!(replica.digest(), authority.digest());

        // A delta the replica never saw leaves it behind; the next digest exposes it.
        authority.remove_item(ItemId::from_u128(2), true).unwrap();
        authority.drain_changes();
        authority.unequip_item(ItemId::from_u128(1)).unwrap();
        let push = DeltaPush::new(OwnerId(1), &authority.drain_changes(), authority.digest());
        assert!(matches!(
            replica.handle_delta(&push),
            ReplicaOutcome::ResyncRequested {
                transfer: TransferId(2),
                reason: ResyncReason::DigestMismatch { .. }
            }
        ));

        // Deltas are discarded until the transfer lands.
        assert_eq!(replica.handle_delta(&push), ReplicaOutcome::Ignored);
        let segments = AuthorityEndpoint::new(OwnerId(1), &InventoryConfig::default())
            .full_state_transfer(&authority, TransferId(2))
            .unwrap();
        for segment in segments {
            replica.handle_segment(segment);
        }
        assert_eq!(replica.digest(), authority.digest());
    }

    #[test]
    fn unknown_item_in_delta_triggers_resync() {
        let mut replica = new_replica();
        let empty = Container::new(OwnerId(1), ContainerKind::PlayerInventory, tables()).unwrap();
        for segment in AuthorityEndpoint::new(OwnerId(1), &InventoryConfig::default())
            .full_state_transfer(&empty, TransferId(1))
            .unwrap()
        {
            replica.handle_segment(segment);
        }

        let ghost = Item::with_id(ItemId::from_u128(77), ItemKind::Furniture, Subkind(1), 1);
        let push = DeltaPush::new(
            OwnerId(1),
            &[ChangeRecord::new(ChangeAction::Remove, ghost)],
            empty.digest(),
        );
        assert!(matches!(
            replica.handle_delta(&push),
            ReplicaOutcome::ResyncRequested {
                reason: ResyncReason::ApplyFailed(ContainerError::ItemNotFound { .. }),
                ..
            }
        ));
    }

    #[test]
    fn newer_transfer_supersedes_in_flight_one() {
        let authority = authority_with_items(6);
        let mut replica = new_replica();
        let old = three_segments(&authority, TransferId(1));
        replica.handle_segment(old[0].clone());

        let newer = three_segments(&authority, TransferId(5));
        assert!(matches!(
            replica.handle_segment(newer[0].clone()),
            ReplicaOutcome::Buffered { received: 1, .. }
        ));
        assert_eq!(replica.handle_segment(old[1].clone()), ReplicaOutcome::Ignored);
        replica.handle_segment(newer[1].clone());
        assert_eq!(
            replica.handle_segment(newer[2].clone()),
            ReplicaOutcome::Installed
        );
        assert_eq!(
            replica.request_resync(ResyncReason::Initial),
            ReplicaOutcome::ResyncRequested {
                transfer: TransferId(6),
                reason: ResyncReason::Initial
            }
        );
    }

    #[test]
    fn delta_during_transfer_restarts_it() {
        let authority = authority_with_items(6);
        let mut replica = new_replica();
        let segments = three_segments(&authority, TransferId(1));
        replica.handle_segment(segments[0].clone());

        let push = DeltaPush::new(OwnerId(1), &[], authority.digest());
        assert!(matches!(
            replica.handle_delta(&push),
            ReplicaOutcome::ResyncRequested {
                transfer: TransferId(2),
                reason: ResyncReason::Protocol(ProtocolError::DeltaDuringTransfer { .. })
            }
        ));
    }

    #[test]
    fn foreign_traffic_is_ignored() {
        let mut replica = new_replica();
        let push = DeltaPush::new(OwnerId(9), &[], StateDigest::from_bytes([0; 32]));
        assert_eq!(replica.handle_delta(&push), ReplicaOutcome::Ignored);
    }
}
