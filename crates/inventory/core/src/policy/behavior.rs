//! Equip side effects dispatched per [`EquipAction`].

use chrono::{DateTime, Utc};

use super::EquipAction;
use crate::config::InventoryConfig;
use crate::item::{AttributeValue, Item};

/// Side effect run by the container when an item is equipped or unequipped.
///
/// Implementations only touch the item's attributes; the container records
/// the resulting snapshot in the emitted change record.
pub trait EquipBehavior: Send + Sync {
    fn on_equip(&self, item: &mut Item, now: DateTime<Utc>);

    fn on_unequip(&self, _item: &mut Item, _now: DateTime<Utc>) {}
}

/// No side effect.
pub struct NoEffect;

impl EquipBehavior for NoEffect {
    fn on_equip(&self, _item: &mut Item, _now: DateTime<Utc>) {}
}

/// Starts a booster's countdown the first time it is equipped.
///
/// Reads `duration_secs` and writes `expires_at` (unix seconds). An existing
/// `expires_at` is left alone so re-equipping never extends the boost.
pub struct TimedBooster;

impl EquipBehavior for TimedBooster {
    fn on_equip(&self, item: &mut Item, now: DateTime<Utc>) {
        if item.attributes.contains_key(InventoryConfig::ATTR_EXPIRES_AT) {
            return;
        }
        let Some(duration) = item
            .attribute(InventoryConfig::ATTR_DURATION_SECS)
            .and_then(AttributeValue::as_int)
        else {
            return;
        };

        let expires_at = now.timestamp().saturating_add(duration.max(0));
        item.attributes.insert(
            InventoryConfig::ATTR_EXPIRES_AT.to_owned(),
            AttributeValue::Int(expires_at),
        );
    }
}

/// Static registry resolving an [`EquipAction`] tag to its behavior.
pub struct EquipBehaviors;

impl EquipBehaviors {
    pub fn for_action(action: EquipAction) -> &'static dyn EquipBehavior {
        static NO_EFFECT: NoEffect = NoEffect;
        static TIMED_BOOSTER: TimedBooster = TimedBooster;

        match action {
            EquipAction::None => &NO_EFFECT,
            EquipAction::TimedBooster => &TIMED_BOOSTER,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::item::{ItemKind, Subkind};

    fn booster(duration: i64) -> Item {
        Item::new(ItemKind::Booster, Subkind(1), 1)
            .with_attribute(InventoryConfig::ATTR_DURATION_SECS, duration)
    }

    #[test]
    fn timed_booster_starts_countdown_once() {
        let start = Utc.timestamp_opt(1_000, 0).unwrap();
        let later = Utc.timestamp_opt(5_000, 0).unwrap();
        let behavior = EquipBehaviors::for_action(EquipAction::TimedBooster);

        let mut item = booster(600);
        behavior.on_equip(&mut item, start);
        assert_eq!(
            item.attribute(InventoryConfig::ATTR_EXPIRES_AT),
            Some(&AttributeValue::Int(1_600))
        );

        behavior.on_equip(&mut item, later);
        assert_eq!(
            item.attribute(InventoryConfig::ATTR_EXPIRES_AT),
            Some(&AttributeValue::Int(1_600))
        );
    }

    #[test]
    fn booster_without_duration_is_untouched() {
        let mut item = Item::new(ItemKind::Booster, Subkind(1), 1);
        let before = item.clone();
        EquipBehaviors::for_action(EquipAction::TimedBooster).on_equip(&mut item, Utc::now());
        assert_eq!(item, before);
    }

    #[test]
    fn none_has_no_effect() {
        let mut item = booster(30);
        let before = item.clone();
        EquipBehaviors::for_action(EquipAction::None).on_equip(&mut item, Utc::now());
        assert_eq!(item, before);
    }
}
