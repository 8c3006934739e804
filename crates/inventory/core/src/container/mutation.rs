//! Policy-checked mutations.
//!
//! Each public operation runs in two phases:
//! 1. `plan_*` - validate against `&self` and describe the steps to take
//! 2. `commit` - apply the steps, queue change records, rebuild derived state
//!
//! Planning is the only phase that can fail, so a rejected call never
//! touches the container. Swaps plan both legs before either commits.

use chrono::Utc;
use tracing::error;

use super::{Container, ContainerError, Violation, enforces_minimum};
use crate::change::{ChangeAction, ChangeRecord};
use crate::identity::ItemId;
use crate::item::{Item, ItemKind, ItemQuery};
use crate::policy::{ContainerPolicy, EquipAction, EquipBehaviors, ItemPolicy};

#[derive(Clone, Debug)]
enum Step {
    Insert(Item),
    /// Replaces a held entry (stack merge).
    Update(Item),
    Remove(ItemId),
    Equip(ItemId, EquipAction),
    Unequip(ItemId, EquipAction),
}

/// Validated steps for one operation, in record order.
#[derive(Clone, Debug, Default)]
#[must_use]
struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    fn push(&mut self, step: Step) {
        self.steps.push(step);
    }
}

impl Container {
    /// Adds an item, merging into matching stacks first.
    ///
    /// The first new entry keeps `item.id`; further overflow entries get
    /// fresh ids. The item is equipped in the same operation when its policy
    /// forces it or the kind is below its equip minimum.
    ///
    /// # Errors
    ///
    /// Returns the violated rule; the container is unchanged.
    pub fn add_item(&mut self, item: Item) -> Result<(), ContainerError> {
        let plan = self.plan_add(item)?;
        self.commit(plan);
        Ok(())
    }

    /// Removes an entry, unequipping it first when needed.
    ///
    /// `manual` marks a player-initiated delete, which must be allowed by
    /// both the container and the item policy. System removals skip that check.
    pub fn remove_item(&mut self, id: ItemId, manual: bool) -> Result<(), ContainerError> {
        let plan = self.plan_remove(id, manual)?;
        self.commit(plan);
        Ok(())
    }

    /// Equips a held item, displacing the oldest equipped item of its kind
    /// when the kind is full and the policy allows forced unequips.
    pub fn equip_item(&mut self, id: ItemId) -> Result<(), ContainerError> {
        let plan = self.plan_equip(id)?;
        self.commit(plan);
        Ok(())
    }

    pub fn unequip_item(&mut self, id: ItemId) -> Result<(), ContainerError> {
        let plan = self.plan_unequip(id)?;
        self.commit(plan);
        Ok(())
    }

    /// Returns why moving `id` into `destination` would fail, if it would.
    pub fn check_swap_to(&self, destination: &Container, id: ItemId) -> Result<(), ContainerError> {
        self.plan_swap(destination, id).map(|_| ())
    }

    pub fn can_swap_item_to(&self, destination: &Container, id: ItemId) -> bool {
        self.check_swap_to(destination, id).is_ok()
    }

    /// Moves an entry into another container as one atomic transfer.
    ///
    /// # Errors
    ///
    /// Fails when either leg would fail; both containers are then unchanged.
    pub fn swap_item_to(
        &mut self,
        destination: &mut Container,
        id: ItemId,
    ) -> Result<(), ContainerError> {
        let (outgoing, incoming) = self.plan_swap(destination, id)?;
        self.commit(outgoing);
        destination.commit(incoming);
        Ok(())
    }

    // ===== planning =====

    fn policies(&self, kind: ItemKind) -> Result<(&ContainerPolicy, &ItemPolicy), ContainerError> {
        Ok((
            self.tables.container_policy(self.kind)?,
            self.tables.item_policy(kind)?,
        ))
    }

    /// Caller-supplied ids are expected to miss sometimes; no index alarm.
    fn held(&self, id: ItemId) -> Result<&Item, ContainerError> {
        self.index
            .position(id)
            .and_then(|position| self.items.get(position))
            .ok_or(ContainerError::ItemNotFound { id })
    }

    fn plan_add(&self, item: Item) -> Result<Plan, ContainerError> {
        let (container, policy) = self.policies(item.kind)?;

        if !container.can_add {
            return Err(Violation::AddNotAllowed.into());
        }
        if !container.accepts(item.kind) {
            return Err(Violation::KindFiltered { kind: item.kind }.into());
        }
        if item.quantity == 0 {
            return Err(Violation::ZeroQuantity.into());
        }
        if self.index.contains(item.id) {
            return Err(Violation::DuplicateItemId { id: item.id }.into());
        }

        let incoming = u64::from(item.quantity);
        if let Some(max) = policy.max_type_quantity
            && self.index.kind_quantity(item.kind) + incoming > u64::from(max)
        {
            return Err(Violation::TypeQuantityExceeded {
                kind: item.kind,
                max,
            }
            .into());
        }
        if let Some(max) = policy.max_subtype_quantity
            && self.index.subkind_quantity(item.kind, item.subkind) + incoming > u64::from(max)
        {
            return Err(Violation::SubtypeQuantityExceeded {
                kind: item.kind,
                subkind: item.subkind,
                max,
            }
            .into());
        }

        let mut plan = Plan::default();
        let mut remaining = item.quantity;
        let stack_size = policy.stack_size.max(1);

        if policy.is_stackable() {
            let candidates = self
                .index
                .positions(ItemQuery::Subkind(item.kind, item.subkind))
                .iter()
                .filter_map(|&position| self.items.get(position));
            for existing in candidates {
                if remaining == 0 {
                    break;
                }
                if !existing.stacks_with(&item) || existing.quantity >= stack_size {
                    continue;
                }
                let moved = remaining.min(stack_size - existing.quantity);
                let mut merged = existing.clone();
                merged.quantity += moved;
                remaining -= moved;
                plan.push(Step::Update(merged));
            }
        }

        let entries = remaining.div_ceil(stack_size) as usize;
        if self.items.len() + entries > container.max_size {
            return Err(Violation::CapacityExceeded {
                max: container.max_size,
            }
            .into());
        }

        let mut incoming_id = Some(item.id);
        let mut first_entry = None;
        while remaining > 0 {
            let quantity = remaining.min(stack_size);
            let mut entry = item.clone();
            entry.id = incoming_id.take().unwrap_or_else(ItemId::generate);
            entry.quantity = quantity;
            entry.owner = None;
            first_entry.get_or_insert(entry.id);
            plan.push(Step::Insert(entry));
            remaining -= quantity;
        }

        if let Some(id) = first_entry
            && self.equips_on_add(container, policy, item.kind)
        {
            self.make_room(&mut plan, item.kind, policy)?;
            plan.push(Step::Equip(id, policy.equip_action));
        }

        Ok(plan)
    }

    fn equips_on_add(&self, container: &ContainerPolicy, policy: &ItemPolicy, kind: ItemKind) -> bool {
        if !container.can_equip || !policy.can_equip || policy.max_equipped == 0 {
            return false;
        }
        policy.force_equip_on_add || self.index.equipped_count(kind) < policy.min_equipped as usize
    }

    /// Frees an equip slot for `kind` by unequipping its oldest equipped item.
    fn make_room(
        &self,
        plan: &mut Plan,
        kind: ItemKind,
        policy: &ItemPolicy,
    ) -> Result<(), ContainerError> {
        if self.index.equipped_count(kind) < policy.max_equipped as usize {
            return Ok(());
        }
        if !policy.can_force_unequip {
            return Err(Violation::MaxEquippedReached {
                kind,
                max: policy.max_equipped,
            }
            .into());
        }
        if let Some(&oldest) = self.index.equipped_of_kind(kind).first() {
            plan.push(Step::Unequip(oldest, policy.equip_action));
        }
        Ok(())
    }

    fn plan_remove(&self, id: ItemId, manual: bool) -> Result<Plan, ContainerError> {
        let item = self.held(id)?;
        let (container, policy) = self.policies(item.kind)?;

        if manual && !(container.can_delete && policy.can_delete) {
            return Err(Violation::DeleteNotAllowed.into());
        }

        let mut plan = Plan::default();
        if !self.is_equipped(id) {
            plan.push(Step::Remove(id));
            return Ok(plan);
        }

        let kind = item.kind;
        let remaining = self.index.count_of(ItemQuery::Kind(kind)) - 1;
        let equipped_after = self.index.equipped_count(kind) - 1;
        let needs_backfill = enforces_minimum(container, policy)
            && remaining > 0
            && equipped_after < policy.min_equipped as usize;

        let backfill = if needs_backfill {
            let replacement = policy
                .can_force_unequip
                .then(|| self.first_unequipped(kind, id))
                .flatten();
            Some(replacement.ok_or(Violation::MinEquippedViolated {
                kind,
                min: policy.min_equipped,
            })?)
        } else {
            None
        };

        plan.push(Step::Unequip(id, policy.equip_action));
        plan.push(Step::Remove(id));
        if let Some(replacement) = backfill {
            plan.push(Step::Equip(replacement, policy.equip_action));
        }
        Ok(plan)
    }

    /// Earliest unequipped item of `kind` in list order, other than `except`.
    fn first_unequipped(&self, kind: ItemKind, except: ItemId) -> Option<ItemId> {
        self.index
            .positions(ItemQuery::Kind(kind))
            .iter()
            .filter_map(|&position| self.items.get(position))
            .map(|item| item.id)
            .find(|&candidate| candidate != except && !self.is_equipped(candidate))
    }

    fn plan_equip(&self, id: ItemId) -> Result<Plan, ContainerError> {
        let item = self.held(id)?;
        let (container, policy) = self.policies(item.kind)?;

        if !container.can_equip {
            return Err(Violation::EquipNotAllowed.into());
        }
        if !policy.can_equip || policy.max_equipped == 0 {
            return Err(Violation::NotEquippable { kind: item.kind }.into());
        }
        if self.is_equipped(id) {
            return Err(Violation::AlreadyEquipped { id }.into());
        }

        let mut plan = Plan::default();
        self.make_room(&mut plan, item.kind, policy)?;
        plan.push(Step::Equip(id, policy.equip_action));
        Ok(plan)
    }

    fn plan_unequip(&self, id: ItemId) -> Result<Plan, ContainerError> {
        let item = self.held(id)?;
        let (container, policy) = self.policies(item.kind)?;

        if !self.is_equipped(id) {
            return Err(Violation::NotEquipped { id }.into());
        }
        if enforces_minimum(container, policy)
            && self.index.equipped_count(item.kind) - 1 < policy.min_equipped as usize
        {
            return Err(Violation::MinEquippedViolated {
                kind: item.kind,
                min: policy.min_equipped,
            }
            .into());
        }

        let mut plan = Plan::default();
        plan.push(Step::Unequip(id, policy.equip_action));
        Ok(plan)
    }

    fn plan_swap(&self, destination: &Container, id: ItemId) -> Result<(Plan, Plan), ContainerError> {
        let source_policy = self.tables.container_policy(self.kind)?;
        let destination_policy = destination.tables.container_policy(destination.kind)?;

        if !source_policy.can_swap_out {
            return Err(Violation::SwapOutNotAllowed.into());
        }
        if !destination_policy.can_swap_in {
            return Err(Violation::SwapInNotAllowed.into());
        }
        if self.kind == destination.kind && !source_policy.can_swap_between_same_kind {
            return Err(Violation::SameKindSwapNotAllowed.into());
        }

        let item = self.held(id)?.clone();
        let outgoing = self.plan_remove(id, false)?;
        let incoming = destination.plan_add(item)?;
        Ok((outgoing, incoming))
    }

    // ===== commit =====

    fn commit(&mut self, plan: Plan) {
        let now = Utc::now();
        let records = plan.steps.len();

        for step in plan.steps {
            let record = match step {
                Step::Insert(mut item) => {
                    item.owner = Some(self.owner);
                    let record = ChangeRecord::new(ChangeAction::Add, item.clone());
                    self.items.push(item);
                    record
                }
                Step::Update(item) => {
                    let Some(slot) = self.slot_mut(item.id) else {
                        continue;
                    };
                    *slot = item.clone();
                    ChangeRecord::new(ChangeAction::Update, item)
                }
                Step::Remove(id) => {
                    let Some(position) = self.items.iter().position(|item| item.id == id) else {
                        continue;
                    };
                    let item = self.items.remove(position);
                    self.equipped.retain(|held| *held != id);
                    ChangeRecord::new(ChangeAction::Remove, item)
                }
                Step::Equip(id, action) => {
                    let Some(slot) = self.slot_mut(id) else {
                        continue;
                    };
                    EquipBehaviors::for_action(action).on_equip(slot, now);
                    let record = ChangeRecord::new(ChangeAction::Equip, slot.clone());
                    self.equipped.push(id);
                    record
                }
                Step::Unequip(id, action) => {
                    let Some(slot) = self.slot_mut(id) else {
                        continue;
                    };
                    EquipBehaviors::for_action(action).on_unequip(slot, now);
                    let record = ChangeRecord::new(ChangeAction::Unequip, slot.clone());
                    self.equipped.retain(|held| *held != id);
                    record
                }
            };
            self.pending.push(record);
        }

        self.finish_batch(records);
    }

    fn slot_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        let slot = self.items.iter_mut().find(|item| item.id == id);
        if slot.is_none() {
            error!(
                target: "inventory::container",
                owner = %self.owner,
                item = %id,
                "Planned step references an item the container no longer holds"
            );
        }
        slot
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::InventoryConfig;
    use crate::identity::OwnerId;
    use crate::item::{AttributeValue, ContainerKind, Subkind};
    use crate::policy::BehaviorTables;

    fn standard() -> Arc<BehaviorTables> {
        Arc::new(BehaviorTables::standard())
    }

    fn container(kind: ContainerKind) -> Container {
        Container::new(OwnerId(1), kind, standard()).unwrap()
    }

    fn item(id: u128, kind: ItemKind, quantity: u32) -> Item {
        Item::with_id(ItemId::from_u128(id), kind, Subkind(1), quantity)
    }

    fn id(raw: u128) -> ItemId {
        ItemId::from_u128(raw)
    }

    fn actions(container: &mut Container) -> Vec<ChangeAction> {
        container
            .drain_changes()
            .iter()
            .map(ChangeRecord::action)
            .collect()
    }

    #[test]
    fn add_over_capacity_is_rejected() {
        let tables = Arc::new(
            BehaviorTables::builder()
                .container(ContainerKind::PlayerInventory, ContainerPolicy::permissive(1))
                .item(ItemKind::Furniture, ItemPolicy::stackable(1))
                .build_partial(),
        );
        let mut bag = Container::new(OwnerId(1), ContainerKind::PlayerInventory, tables).unwrap();

        bag.add_item(item(1, ItemKind::Furniture, 1)).unwrap();
        let error = bag.add_item(item(2, ItemKind::Furniture, 1)).unwrap_err();

        assert_eq!(error, ContainerError::Violation(Violation::CapacityExceeded { max: 1 }));
        assert_eq!(bag.items().len(), 1);
        assert_eq!(bag.items()[0].id, id(1));
    }

    #[test]
    fn forced_equip_displaces_oldest() {
        let mut bag = container(ContainerKind::PlayerInventory);

        bag.add_item(item(1, ItemKind::Nametag, 1)).unwrap();
        assert_eq!(bag.equipped_ids(), &[id(1)]);
        assert_eq!(actions(&mut bag), vec![ChangeAction::Add, ChangeAction::Equip]);

        bag.add_item(item(2, ItemKind::Nametag, 1)).unwrap();
        assert_eq!(bag.equipped_ids(), &[id(2)]);
        assert_eq!(
            actions(&mut bag),
            vec![ChangeAction::Add, ChangeAction::Unequip, ChangeAction::Equip]
        );
        bag.check_invariants().unwrap();
    }

    #[test]
    fn forced_equip_without_force_unequip_fails_whole_add() {
        let tables = Arc::new(
            BehaviorTables::builder()
                .container(ContainerKind::PlayerInventory, ContainerPolicy::permissive(8))
                .item(
                    ItemKind::Nametag,
                    ItemPolicy {
                        force_equip_on_add: true,
                        can_force_unequip: false,
                        ..ItemPolicy::equippable(1)
                    },
                )
                .build_partial(),
        );
        let mut bag = Container::new(OwnerId(1), ContainerKind::PlayerInventory, tables).unwrap();
        bag.add_item(item(1, ItemKind::Nametag, 1)).unwrap();
        let before = bag.digest();

        let error = bag.add_item(item(2, ItemKind::Nametag, 1)).unwrap_err();
        assert_eq!(
            error,
            ContainerError::Violation(Violation::MaxEquippedReached {
                kind: ItemKind::Nametag,
                max: 1
            })
        );
        assert_eq!(bag.digest(), before);
        assert_eq!(bag.item_count(), 1);
    }

    #[test]
    fn stacking_splits_into_ceil_entries() {
        for total in [1u32, 98, 99, 100, 250, 495] {
            let mut bag = container(ContainerKind::PlayerInventory);
            bag.add_item(item(1, ItemKind::Consumable, total)).unwrap();

            let entries = bag.find_items(ItemKind::Consumable);
            assert_eq!(entries.len(), total.div_ceil(99) as usize, "total {total}");
            assert!(entries.iter().all(|entry| entry.quantity <= 99));
            assert_eq!(entries.iter().map(|entry| entry.quantity).sum::<u32>(), total);
            assert_eq!(entries[0].id, id(1));
            bag.check_invariants().unwrap();
        }
    }

    #[test]
    fn stacking_merges_before_creating_entries() {
        let mut bag = container(ContainerKind::PlayerInventory);
        bag.add_item(item(1, ItemKind::Consumable, 90)).unwrap();
        bag.drain_changes();

        bag.add_item(item(2, ItemKind::Consumable, 20)).unwrap();
        let records = bag.drain_changes();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].action(), ChangeAction::Update);
        assert_eq!(records[0].item().id, id(1));
        assert_eq!(records[0].item().quantity, 99);
        assert_eq!(records[1].action(), ChangeAction::Add);
        assert_eq!(records[1].item().id, id(2));
        assert_eq!(records[1].item().quantity, 11);

        // Fully absorbed: the incoming id is retired.
        let mut bag = container(ContainerKind::PlayerInventory);
        bag.add_item(item(1, ItemKind::Consumable, 10)).unwrap();
        bag.add_item(item(2, ItemKind::Consumable, 5)).unwrap();
        assert_eq!(bag.item_count(), 1);
        assert!(!bag.contains(id(2)));
    }

    #[test]
    fn differing_attributes_never_stack() {
        let mut bag = container(ContainerKind::PlayerInventory);
        bag.add_item(item(1, ItemKind::Consumable, 5).with_attribute("flavor", "mint"))
            .unwrap();
        bag.add_item(item(2, ItemKind::Consumable, 5).with_attribute("flavor", "lime"))
            .unwrap();
        assert_eq!(bag.item_count(), 2);
    }

    #[test]
    fn add_checks_filters_and_quantity_bounds() {
        let mut wardrobe = container(ContainerKind::Wardrobe);
        assert_eq!(
            wardrobe
                .add_item(item(1, ItemKind::Consumable, 1))
                .unwrap_err(),
            ContainerError::Violation(Violation::KindFiltered {
                kind: ItemKind::Consumable
            })
        );

        let mut bag = container(ContainerKind::PlayerInventory);
        assert_eq!(
            bag.add_item(item(1, ItemKind::Consumable, 0)).unwrap_err(),
            ContainerError::Violation(Violation::ZeroQuantity)
        );
        assert_eq!(
            bag.add_item(item(2, ItemKind::Consumable, 501)).unwrap_err(),
            ContainerError::Violation(Violation::TypeQuantityExceeded {
                kind: ItemKind::Consumable,
                max: 500
            })
        );

        bag.add_item(item(3, ItemKind::Collectible, 1)).unwrap();
        assert_eq!(
            bag.add_item(item(4, ItemKind::Collectible, 1)).unwrap_err(),
            ContainerError::Violation(Violation::SubtypeQuantityExceeded {
                kind: ItemKind::Collectible,
                subkind: Subkind(1),
                max: 1
            })
        );
        let mut other_model = item(5, ItemKind::Collectible, 1);
        other_model.subkind = Subkind(2);
        bag.add_item(other_model).unwrap();

        assert_eq!(
            bag.add_item(item(3, ItemKind::Furniture, 1)).unwrap_err(),
            ContainerError::Violation(Violation::DuplicateItemId { id: id(3) })
        );
    }

    #[test]
    fn add_not_allowed_is_reported() {
        let tables = Arc::new(
            BehaviorTables::builder()
                .container(
                    ContainerKind::Mailbox,
                    ContainerPolicy {
                        can_add: false,
                        ..ContainerPolicy::permissive(4)
                    },
                )
                .item(ItemKind::Furniture, ItemPolicy::stackable(1))
                .build_partial(),
        );
        let mut mailbox = Container::new(OwnerId(1), ContainerKind::Mailbox, tables).unwrap();
        assert_eq!(
            mailbox.add_item(item(1, ItemKind::Furniture, 1)).unwrap_err(),
            ContainerError::Violation(Violation::AddNotAllowed)
        );
    }

    #[test]
    fn manual_delete_honours_both_policies() {
        let mut bag = container(ContainerKind::PlayerInventory);
        bag.add_item(item(1, ItemKind::Currency, 500)).unwrap();
        assert_eq!(
            bag.remove_item(id(1), true).unwrap_err(),
            ContainerError::Violation(Violation::DeleteNotAllowed)
        );
        bag.remove_item(id(1), false).unwrap();
        assert!(!bag.contains(id(1)));

        let mut chest = container(ContainerKind::SharedChest);
        chest.add_item(item(2, ItemKind::Furniture, 1)).unwrap();
        assert_eq!(
            chest.remove_item(id(2), true).unwrap_err(),
            ContainerError::Violation(Violation::DeleteNotAllowed)
        );
        chest.remove_item(id(2), false).unwrap();

        assert_eq!(
            chest.remove_item(id(2), false).unwrap_err(),
            ContainerError::ItemNotFound { id: id(2) }
        );
    }

    #[test]
    fn removing_equipped_item_unequips_then_backfills() {
        let mut bag = container(ContainerKind::PlayerInventory);
        bag.add_item(item(1, ItemKind::Nametag, 1)).unwrap();
        bag.add_item(item(2, ItemKind::Nametag, 1)).unwrap();
        bag.drain_changes();
        assert_eq!(bag.equipped_ids(), &[id(2)]);

        bag.remove_item(id(2), true).unwrap();
        let records = bag.drain_changes();
        let summary: Vec<_> = records
            .iter()
            .map(|record| (record.action(), record.item().id))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ChangeAction::Unequip, id(2)),
                (ChangeAction::Remove, id(2)),
                (ChangeAction::Equip, id(1)),
            ]
        );
        assert_eq!(bag.equipped_ids(), &[id(1)]);

        // Last of its kind: nothing left to keep equipped.
        bag.remove_item(id(1), true).unwrap();
        assert_eq!(
            actions(&mut bag),
            vec![ChangeAction::Unequip, ChangeAction::Remove]
        );
        assert!(bag.equipped_ids().is_empty());
        bag.check_invariants().unwrap();
    }

    fn strict_minimum_tables() -> Arc<BehaviorTables> {
        Arc::new(
            BehaviorTables::builder()
                .container(ContainerKind::PlayerInventory, ContainerPolicy::permissive(8))
                .item(
                    ItemKind::Accessory,
                    ItemPolicy {
                        min_equipped: 1,
                        can_force_unequip: false,
                        ..ItemPolicy::equippable(1)
                    },
                )
                .build_partial(),
        )
    }

    #[test]
    fn minimum_without_force_unequip_blocks_removal_and_unequip() {
        let mut bag =
            Container::new(OwnerId(1), ContainerKind::PlayerInventory, strict_minimum_tables())
                .unwrap();
        bag.add_item(item(1, ItemKind::Accessory, 1)).unwrap();
        bag.add_item(item(2, ItemKind::Accessory, 1)).unwrap();
        assert_eq!(bag.equipped_ids(), &[id(1)], "first add fills the minimum");
        let before = bag.digest();

        let violation: ContainerError = ContainerError::Violation(Violation::MinEquippedViolated {
            kind: ItemKind::Accessory,
            min: 1,
        });
        assert_eq!(bag.remove_item(id(1), true).unwrap_err(), violation);
        assert_eq!(bag.unequip_item(id(1)).unwrap_err(), violation);
        assert_eq!(bag.digest(), before);

        // The unequipped spare can go.
        bag.remove_item(id(2), true).unwrap();
        bag.check_invariants().unwrap();
    }

    #[test]
    fn equip_beyond_max_displaces_oldest_when_allowed() {
        let mut bag = container(ContainerKind::PlayerInventory);
        for raw in 1..=3 {
            bag.add_item(item(raw, ItemKind::Accessory, 1)).unwrap();
        }
        bag.equip_item(id(1)).unwrap();
        bag.equip_item(id(2)).unwrap();
        bag.drain_changes();

        bag.equip_item(id(3)).unwrap();
        assert_eq!(bag.equipped_ids(), &[id(2), id(3)]);
        let records = bag.drain_changes();
        assert_eq!(records[0].action(), ChangeAction::Unequip);
        assert_eq!(records[0].item().id, id(1));
        assert_eq!(records[1].action(), ChangeAction::Equip);

        assert_eq!(
            bag.equip_item(id(3)).unwrap_err(),
            ContainerError::Violation(Violation::AlreadyEquipped { id: id(3) })
        );
        assert_eq!(
            bag.unequip_item(id(1)).unwrap_err(),
            ContainerError::Violation(Violation::NotEquipped { id: id(1) })
        );
    }

    #[test]
    fn equip_is_gated_by_both_policies() {
        let mut chest = container(ContainerKind::SharedChest);
        chest.add_item(item(1, ItemKind::Clothing, 1)).unwrap();
        assert_eq!(
            chest.equip_item(id(1)).unwrap_err(),
            ContainerError::Violation(Violation::EquipNotAllowed)
        );

        let mut bag = container(ContainerKind::PlayerInventory);
        bag.add_item(item(2, ItemKind::Furniture, 1)).unwrap();
        assert_eq!(
            bag.equip_item(id(2)).unwrap_err(),
            ContainerError::Violation(Violation::NotEquippable {
                kind: ItemKind::Furniture
            })
        );
        assert_eq!(
            bag.equip_item(id(9)).unwrap_err(),
            ContainerError::ItemNotFound { id: id(9) }
        );
    }

    #[test]
    fn nametags_in_non_equipping_containers_stay_unequipped() {
        let mut chest = container(ContainerKind::SharedChest);
        chest.add_item(item(1, ItemKind::Nametag, 1)).unwrap();
        assert!(chest.equipped_ids().is_empty());
        chest.check_invariants().unwrap();
    }

    #[test]
    fn timed_booster_starts_once() {
        let mut bag = container(ContainerKind::PlayerInventory);
        let booster = item(1, ItemKind::Booster, 1)
            .with_attribute(InventoryConfig::ATTR_DURATION_SECS, 600i64);
        bag.add_item(booster).unwrap();
        assert!(bag.equipped_ids().is_empty());

        let before = Utc::now().timestamp();
        bag.equip_item(id(1)).unwrap();
        let expires_at = bag
            .get_item(id(1))
            .unwrap()
            .attribute(InventoryConfig::ATTR_EXPIRES_AT)
            .and_then(AttributeValue::as_int)
            .unwrap();
        assert!(expires_at >= before + 600);

        let records = bag.drain_changes();
        assert_eq!(
            records[0]
                .item()
                .attribute(InventoryConfig::ATTR_EXPIRES_AT),
            Some(&AttributeValue::Int(expires_at)),
            "the equip record carries the post-effect snapshot"
        );

        bag.unequip_item(id(1)).unwrap();
        bag.equip_item(id(1)).unwrap();
        assert_eq!(
            bag.get_item(id(1))
                .unwrap()
                .attribute(InventoryConfig::ATTR_EXPIRES_AT),
            Some(&AttributeValue::Int(expires_at))
        );
    }

    #[test]
    fn failed_swap_leaves_both_containers_identical() {
        let mut bag = container(ContainerKind::PlayerInventory);
        let mut mailbox = container(ContainerKind::Mailbox);
        bag.add_item(item(1, ItemKind::Furniture, 1)).unwrap();
        bag.drain_changes();
        let (bag_before, mailbox_before) = (bag.snapshot(), mailbox.snapshot());

        assert!(!bag.can_swap_item_to(&mailbox, id(1)));
        assert_eq!(
            bag.swap_item_to(&mut mailbox, id(1)).unwrap_err(),
            ContainerError::Violation(Violation::SwapInNotAllowed)
        );
        assert_eq!(bag.snapshot(), bag_before);
        assert_eq!(mailbox.snapshot(), mailbox_before);
        assert!(!bag.has_pending_changes());
        assert!(!mailbox.has_pending_changes());

        // Destination leg failing (filter) also rolls back nothing.
        let mut wardrobe = container(ContainerKind::Wardrobe);
        assert_eq!(
            bag.check_swap_to(&wardrobe, id(1)).unwrap_err(),
            ContainerError::Violation(Violation::KindFiltered {
                kind: ItemKind::Furniture
            })
        );
        assert!(bag.swap_item_to(&mut wardrobe, id(1)).is_err());
        assert_eq!(bag.snapshot(), bag_before);
        assert_eq!(wardrobe.item_count(), 0);
    }

    #[test]
    fn swap_moves_item_and_records_both_legs() {
        let mut bag = container(ContainerKind::PlayerInventory);
        let mut wardrobe = container(ContainerKind::Wardrobe);
        bag.add_item(item(1, ItemKind::Clothing, 1)).unwrap();
        bag.equip_item(id(1)).unwrap();
        bag.drain_changes();

        bag.swap_item_to(&mut wardrobe, id(1)).unwrap();
        assert!(!bag.contains(id(1)));
        assert!(wardrobe.contains(id(1)));
        assert_eq!(wardrobe.get_item(id(1)).unwrap().owner, Some(OwnerId(1)));
        assert!(!wardrobe.is_equipped(id(1)));
        assert_eq!(
            actions(&mut bag),
            vec![ChangeAction::Unequip, ChangeAction::Remove]
        );
        assert_eq!(actions(&mut wardrobe), vec![ChangeAction::Add]);
    }

    #[test]
    fn same_kind_swaps_follow_policy() {
        let mut first = container(ContainerKind::PlayerInventory);
        let second = Container::new(OwnerId(2), ContainerKind::PlayerInventory, standard()).unwrap();
        first.add_item(item(1, ItemKind::Furniture, 1)).unwrap();
        assert_eq!(
            first.check_swap_to(&second, id(1)).unwrap_err(),
            ContainerError::Violation(Violation::SameKindSwapNotAllowed)
        );

        let mut chest = container(ContainerKind::SharedChest);
        let mut other_chest =
            Container::new(OwnerId(2), ContainerKind::SharedChest, standard()).unwrap();
        chest.add_item(item(2, ItemKind::Furniture, 1)).unwrap();
        chest.swap_item_to(&mut other_chest, id(2)).unwrap();
        assert!(other_chest.contains(id(2)));
    }

    #[test]
    fn replica_converges_by_applying_drained_records() {
        let mut authority = container(ContainerKind::PlayerInventory);
        let mut replica =
            Container::from_snapshot(authority.snapshot(), Arc::clone(authority.tables())).unwrap();

        authority
            .add_item(
                item(1, ItemKind::Booster, 1)
                    .with_attribute(InventoryConfig::ATTR_DURATION_SECS, 60i64),
            )
            .unwrap();
        authority.add_item(item(2, ItemKind::Consumable, 150)).unwrap();
        authority.add_item(item(3, ItemKind::Nametag, 1)).unwrap();
        authority.equip_item(id(1)).unwrap();
        authority.add_item(item(4, ItemKind::Consumable, 60)).unwrap();
        authority.remove_item(id(2), true).unwrap();

        replica.apply_changes(&authority.drain_changes()).unwrap();
        assert_eq!(replica.digest(), authority.digest());
        assert_eq!(replica.snapshot(), authority.snapshot());
    }

    #[test]
    fn invariants_hold_across_mixed_sequences() {
        let kinds = [
            ItemKind::Clothing,
            ItemKind::Accessory,
            ItemKind::Nametag,
            ItemKind::Booster,
            ItemKind::Consumable,
            ItemKind::Collectible,
        ];
        let mut bag = container(ContainerKind::PlayerInventory);
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };

        for step in 0..400u128 {
            let roll = next();
            let before = bag.snapshot();
            let held: Vec<ItemId> = bag.items().iter().map(|item| item.id).collect();
            let target = (!held.is_empty()).then(|| held[(roll as usize / 7) % held.len()]);

            let result = match (roll % 5, target) {
                (0 | 1, _) | (_, None) => {
                    let kind = kinds[(roll as usize / 11) % kinds.len()];
                    let quantity = match kind {
                        ItemKind::Consumable => 1 + (roll % 120) as u32,
                        _ => 1,
                    };
                    let mut new_item = item(1000 + step, kind, quantity);
                    new_item.subkind = Subkind((roll % 3) as u16);
                    bag.add_item(new_item)
                }
                (2, Some(target)) => bag.remove_item(target, roll % 2 == 0),
                (3, Some(target)) => bag.equip_item(target),
                (_, Some(target)) => bag.unequip_item(target),
            };

            if result.is_err() {
                assert_eq!(bag.snapshot(), before, "rejected step {step} mutated state");
            }
            bag.check_invariants()
                .unwrap_or_else(|error| panic!("step {step}: {error}"));
            assert!(bag.item_count() <= 64);
        }
    }
}
