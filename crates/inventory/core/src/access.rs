//! Per-container access grants.
//!
//! An actor either has no access, [`AccessLevel::View`], or
//! [`AccessLevel::Use`]. `Use` is the higher level, so anyone allowed to use
//! a container can also view it without a separate check.

use std::collections::BTreeMap;

use crate::error::{ErrorSeverity, InventoryError};
use crate::identity::{ActorId, OwnerId};

/// What an actor may do with a container.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum AccessLevel {
    /// Receives replication pushes.
    View,
    /// May also request mutations.
    Use,
}

impl AccessLevel {
    pub fn can_view(&self) -> bool {
        true
    }

    pub fn can_use(&self) -> bool {
        matches!(self, AccessLevel::Use)
    }
}

/// Actor lacks the access level an operation requires.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{actor} lacks {required:?} access to {owner}")]
pub struct AccessDenied {
    pub actor: ActorId,
    pub owner: OwnerId,
    pub required: AccessLevel,
}

impl InventoryError for AccessDenied {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        "ACCESS_DENIED"
    }
}

/// Grant table for one container.
///
/// The owning actor (the one whose id matches the container owner) always
/// has `Use` and never appears in the table.
#[derive(Clone, Debug)]
pub struct AccessController {
    owner: OwnerId,
    grants: BTreeMap<ActorId, AccessLevel>,
}

impl AccessController {
    pub fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            grants: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Grants `level`, replacing any previous grant. Returns the old level.
    pub fn grant(&mut self, actor: ActorId, level: AccessLevel) -> Option<AccessLevel> {
        self.grants.insert(actor, level)
    }

    pub fn revoke(&mut self, actor: ActorId) -> Option<AccessLevel> {
        self.grants.remove(&actor)
    }

    pub fn level(&self, actor: ActorId) -> Option<AccessLevel> {
        if self.is_owner(actor) {
            return Some(AccessLevel::Use);
        }
        self.grants.get(&actor).copied()
    }

    pub fn can_view(&self, actor: ActorId) -> bool {
        self.level(actor).is_some_and(|level| level.can_view())
    }

    pub fn can_use(&self, actor: ActorId) -> bool {
        self.level(actor).is_some_and(|level| level.can_use())
    }

    pub fn check_view(&self, actor: ActorId) -> Result<(), AccessDenied> {
        self.require(actor, AccessLevel::View, self.can_view(actor))
    }

    pub fn check_use(&self, actor: ActorId) -> Result<(), AccessDenied> {
        self.require(actor, AccessLevel::Use, self.can_use(actor))
    }

    /// Granted actors that may view, in actor order. Excludes the owner.
    pub fn viewers(&self) -> Vec<ActorId> {
        self.grants.keys().copied().collect()
    }

    /// Granted actors that may use, in actor order. Excludes the owner.
    pub fn users(&self) -> Vec<ActorId> {
        self.grants
            .iter()
            .filter(|(_, level)| level.can_use())
            .map(|(actor, _)| *actor)
            .collect()
    }

    fn is_owner(&self, actor: ActorId) -> bool {
        OwnerId::from(actor) == self.owner
    }

    fn require(&self, actor: ActorId, required: AccessLevel, allowed: bool) -> Result<(), AccessDenied> {
        if allowed {
            Ok(())
        } else {
            Err(AccessDenied {
                actor,
                owner: self.owner,
                required,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn use_implies_view() {
        let mut access = AccessController::new(OwnerId(1));
        access.grant(ActorId(7), AccessLevel::Use);
        assert!(access.can_use(ActorId(7)));
        assert!(access.can_view(ActorId(7)));
        assert_eq!(access.users(), vec![ActorId(7)]);
        assert_eq!(access.viewers(), vec![ActorId(7)]);
    }

    #[test]
    fn view_only_cannot_use() {
        let mut access = AccessController::new(OwnerId(1));
        access.grant(ActorId(3), AccessLevel::View);
        access.grant(ActorId(2), AccessLevel::Use);

        assert!(access.can_view(ActorId(3)));
        assert_eq!(
            access.check_use(ActorId(3)),
            Err(AccessDenied {
                actor: ActorId(3),
                owner: OwnerId(1),
                required: AccessLevel::Use,
            })
        );
        assert_eq!(access.viewers(), vec![ActorId(2), ActorId(3)]);
        assert_eq!(access.users(), vec![ActorId(2)]);
    }

    #[test]
    fn grant_replaces_and_revoke_removes() {
        let mut access = AccessController::new(OwnerId(1));
        assert_eq!(access.grant(ActorId(5), AccessLevel::Use), None);
        assert_eq!(
            access.grant(ActorId(5), AccessLevel::View),
            Some(AccessLevel::Use)
        );
        assert!(!access.can_use(ActorId(5)));

        assert_eq!(access.revoke(ActorId(5)), Some(AccessLevel::View));
        assert!(access.check_view(ActorId(5)).is_err());
        assert!(access.viewers().is_empty());
    }

    #[test]
    fn owner_always_has_use() {
        let access = AccessController::new(OwnerId(4));
        assert!(access.can_use(ActorId(4)));
        assert!(access.check_view(ActorId(4)).is_ok());
        assert!(access.users().is_empty());
    }
}
