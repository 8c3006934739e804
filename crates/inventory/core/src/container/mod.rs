//! Policy-governed item collections.
//!
//! A [`Container`] is the only way to mutate items. Every mutating call is
//! computed as a plan against the current state and then committed, so a
//! rejected call never leaves partial state behind. Committed calls queue
//! [`ChangeRecord`]s for replication and refresh the [`DerivedIndex`] and
//! [`StateDigest`].
mod digest;
mod error;
mod index;
mod mutation;

pub use digest::StateDigest;
pub use error::{ContainerError, Violation};
pub use index::DerivedIndex;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::change::{ChangeAction, ChangeRecord};
use crate::identity::{ItemId, OwnerId};
use crate::item::{ContainerKind, Item, ItemQuery};
use crate::policy::{BehaviorTables, ContainerPolicy};

/// Plain container state: the persisted form and the payload of a
/// full-state transfer.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContainerSnapshot {
    pub owner: OwnerId,
    pub kind: ContainerKind,
    pub items: Vec<Item>,
    /// Equipped ids in equip order.
    pub equipped: Vec<ItemId>,
}

impl ContainerSnapshot {
    pub fn empty(owner: OwnerId, kind: ContainerKind) -> Self {
        Self {
            owner,
            kind,
            items: Vec::new(),
            equipped: Vec::new(),
        }
    }
}

/// An owner's bounded collection of items.
#[derive(Clone, Debug)]
pub struct Container {
    owner: OwnerId,
    kind: ContainerKind,
    items: Vec<Item>,
    equipped: Vec<ItemId>,
    tables: Arc<BehaviorTables>,
    index: DerivedIndex,
    digest: StateDigest,
    pending: Vec<ChangeRecord>,
    revision: u64,
}

impl Container {
    /// Creates an empty container.
    ///
    /// # Errors
    ///
    /// Fails with `ContainerError::Policy` when `kind` has no registered
    /// container policy.
    pub fn new(
        owner: OwnerId,
        kind: ContainerKind,
        tables: Arc<BehaviorTables>,
    ) -> Result<Self, ContainerError> {
        Self::from_snapshot(ContainerSnapshot::empty(owner, kind), tables)
    }

    /// Restores a container from persisted or transferred state.
    ///
    /// Only structural invariants are checked here (unique ids, equipped ids
    /// held, capacity, positive quantities, registered policies); the state
    /// was produced by a container and is not re-planned.
    pub fn from_snapshot(
        snapshot: ContainerSnapshot,
        tables: Arc<BehaviorTables>,
    ) -> Result<Self, ContainerError> {
        let policy = tables.container_policy(snapshot.kind)?;
        validate_structure(&snapshot, policy, &tables)?;

        let ContainerSnapshot {
            owner,
            kind,
            mut items,
            equipped,
        } = snapshot;
        for item in &mut items {
            item.owner = Some(owner);
        }

        let index = DerivedIndex::rebuild(&items, &equipped);
        let digest = StateDigest::compute(kind, &items, &equipped);
        Ok(Self {
            owner,
            kind,
            items,
            equipped,
            tables,
            index,
            digest,
            pending: Vec::new(),
            revision: 0,
        })
    }

    /// Copies the replicated state out of the container.
    pub fn snapshot(&self) -> ContainerSnapshot {
        ContainerSnapshot {
            owner: self.owner,
            kind: self.kind,
            items: self
                .items
                .iter()
                .cloned()
                .map(|mut item| {
                    item.owner = None;
                    item
                })
                .collect(),
            equipped: self.equipped.clone(),
        }
    }

    /// Atomically replaces the whole state, as a replica does when a
    /// full-state transfer completes. Queued records are discarded.
    ///
    /// # Errors
    ///
    /// The snapshot is validated first; on failure the container is untouched.
    pub fn replace_with(&mut self, snapshot: ContainerSnapshot) -> Result<(), ContainerError> {
        let revision = self.revision;
        let mut replacement = Self::from_snapshot(snapshot, Arc::clone(&self.tables))?;
        replacement.revision = revision + 1;
        *self = replacement;
        Ok(())
    }

    // ===== queries =====

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn tables(&self) -> &Arc<BehaviorTables> {
        &self.tables
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.index.item_count()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.index.contains(id)
    }

    /// Looks an item up through the derived index.
    pub fn get_item(&self, id: ItemId) -> Result<&Item, ContainerError> {
        self.index.get_item(&self.items, id)
    }

    /// Items matching a kind or kind/subkind query, in list order.
    pub fn find_items(&self, query: impl Into<ItemQuery>) -> Vec<&Item> {
        self.index
            .positions(query.into())
            .iter()
            .filter_map(|&position| self.items.get(position))
            .collect()
    }

    /// Equipped ids in equip order.
    pub fn equipped_ids(&self) -> &[ItemId] {
        &self.equipped
    }

    pub fn is_equipped(&self, id: ItemId) -> bool {
        self.equipped.contains(&id)
    }

    pub fn equipped_items(&self) -> Vec<&Item> {
        self.index
            .equipped_positions()
            .iter()
            .filter_map(|&position| self.items.get(position))
            .collect()
    }

    pub fn index(&self) -> &DerivedIndex {
        &self.index
    }

    pub fn digest(&self) -> StateDigest {
        self.digest
    }

    /// Number of committed batches since construction.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.index.last_modified()
    }

    // ===== change queue =====

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Takes every queued record, oldest first.
    pub fn drain_changes(&mut self) -> Vec<ChangeRecord> {
        std::mem::take(&mut self.pending)
    }

    // ===== replica apply =====

    /// Applies one authority record without evaluating policies.
    ///
    /// # Errors
    ///
    /// `ItemNotFound` when the record names an item this container does not
    /// hold, `DuplicateItemId` when an add repeats a held id. Either means
    /// the replica diverged; the container is left untouched.
    pub fn apply_change(&mut self, record: &ChangeRecord) -> Result<(), ContainerError> {
        self.apply_changes(std::slice::from_ref(record))
    }

    /// Applies a delta in receipt order as a single batch.
    ///
    /// Records are applied to a staged copy; the container only changes when
    /// every record applied.
    pub fn apply_changes(&mut self, records: &[ChangeRecord]) -> Result<(), ContainerError> {
        let mut items = self.items.clone();
        let mut equipped = self.equipped.clone();
        for record in records {
            apply_record(self.owner, &mut items, &mut equipped, record)?;
        }

        self.items = items;
        self.equipped = equipped;
        self.finish_batch(records.len());
        Ok(())
    }

    /// Re-checks every invariant against the container's policies.
    ///
    /// Mutations keep these by construction; this is the post-condition
    /// check used by tests and debug builds.
    pub fn check_invariants(&self) -> Result<(), ContainerError> {
        let policy = self.tables.container_policy(self.kind)?;
        validate_structure(&self.snapshot(), policy, &self.tables)?;

        let mut kinds: Vec<_> = self.items.iter().map(|item| item.kind).collect();
        kinds.sort();
        kinds.dedup();
        for kind in kinds {
            if !policy.accepts(kind) {
                return Err(Violation::KindFiltered { kind }.into());
            }
            let item_policy = self.tables.item_policy(kind)?;
            let equipped = self.index.equipped_count(kind) as u32;
            if equipped > item_policy.max_equipped {
                return Err(Violation::MaxEquippedReached {
                    kind,
                    max: item_policy.max_equipped,
                }
                .into());
            }
            if enforces_minimum(policy, item_policy) && equipped < item_policy.min_equipped {
                return Err(Violation::MinEquippedViolated {
                    kind,
                    min: item_policy.min_equipped,
                }
                .into());
            }
            if let Some(max) = item_policy.max_type_quantity
                && self.index.kind_quantity(kind) > u64::from(max)
            {
                return Err(Violation::TypeQuantityExceeded { kind, max }.into());
            }
            for item in self.items.iter().filter(|item| item.kind == kind) {
                if item.quantity > item_policy.stack_size {
                    return Err(Violation::StackSizeExceeded {
                        kind,
                        max: item_policy.stack_size,
                    }
                    .into());
                }
                if let Some(max) = item_policy.max_subtype_quantity
                    && self.index.subkind_quantity(kind, item.subkind) > u64::from(max)
                {
                    return Err(Violation::SubtypeQuantityExceeded {
                        kind,
                        subkind: item.subkind,
                        max,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Rebuilds derived state after a batch of `records` changes.
    fn finish_batch(&mut self, records: usize) {
        self.index = DerivedIndex::rebuild(&self.items, &self.equipped);
        self.digest = StateDigest::compute(self.kind, &self.items, &self.equipped);
        self.revision += 1;

        debug!(
            target: "inventory::container",
            owner = %self.owner,
            kind = %self.kind,
            records,
            revision = self.revision,
            digest = %self.digest.short(),
            "Container batch committed"
        );
    }
}

/// Minimum equip counts only apply where equipping is possible at all.
pub(crate) fn enforces_minimum(
    container: &ContainerPolicy,
    item: &crate::policy::ItemPolicy,
) -> bool {
    container.can_equip && item.can_equip && item.min_equipped > 0
}

fn validate_structure(
    snapshot: &ContainerSnapshot,
    policy: &ContainerPolicy,
    tables: &BehaviorTables,
) -> Result<(), ContainerError> {
    if snapshot.items.len() > policy.max_size {
        return Err(Violation::CapacityExceeded {
            max: policy.max_size,
        }
        .into());
    }

    let mut ids = HashSet::with_capacity(snapshot.items.len());
    for item in &snapshot.items {
        tables.item_policy(item.kind)?;
        if item.quantity == 0 {
            return Err(Violation::ZeroQuantity.into());
        }
        if !ids.insert(item.id) {
            return Err(Violation::DuplicateItemId { id: item.id }.into());
        }
    }

    let mut seen = HashSet::with_capacity(snapshot.equipped.len());
    for &id in &snapshot.equipped {
        if !ids.contains(&id) {
            return Err(ContainerError::ItemNotFound { id });
        }
        if !seen.insert(id) {
            return Err(Violation::AlreadyEquipped { id }.into());
        }
    }
    Ok(())
}

fn apply_record(
    owner: OwnerId,
    items: &mut Vec<Item>,
    equipped: &mut Vec<ItemId>,
    record: &ChangeRecord,
) -> Result<(), ContainerError> {
    let id = record.item().id;
    let position = items.iter().position(|item| item.id == id);

    match (record.action(), position) {
        (ChangeAction::Add, Some(_)) => Err(Violation::DuplicateItemId { id }.into()),
        (ChangeAction::Add, None) => {
            let mut item = record.item().clone();
            item.owner = Some(owner);
            items.push(item);
            Ok(())
        }
        (_, None) => Err(ContainerError::ItemNotFound { id }),
        (ChangeAction::Remove, Some(position)) => {
            items.remove(position);
            equipped.retain(|held| *held != id);
            Ok(())
        }
        (action, Some(position)) => {
            let mut item = record.item().clone();
            item.owner = Some(owner);
            items[position] = item;
            match action {
                ChangeAction::Equip if !equipped.contains(&id) => equipped.push(id),
                ChangeAction::Unequip => equipped.retain(|held| *held != id),
                _ => {}
            }
            Ok(())
        }
    }
}
