//! Container errors.
//!
//! Every rejected mutation leaves the container untouched; the error names the
//! rule that refused it.

use crate::error::{ErrorSeverity, InventoryError};
use crate::identity::ItemId;
use crate::item::{ItemKind, Subkind};
use crate::policy::PolicyError;

/// A broken [`crate::ContainerPolicy`] or [`crate::ItemPolicy`] rule.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("container does not accept new items")]
    AddNotAllowed,

    #[error("container does not accept {kind} items")]
    KindFiltered { kind: ItemKind },

    #[error("container is full (max: {max})")]
    CapacityExceeded { max: usize },

    #[error("{kind} quantity would exceed {max}")]
    TypeQuantityExceeded { kind: ItemKind, max: u32 },

    #[error("{kind}/{} quantity would exceed {max}", .subkind.0)]
    SubtypeQuantityExceeded {
        kind: ItemKind,
        subkind: Subkind,
        max: u32,
    },

    #[error("{kind} entries hold at most {max}")]
    StackSizeExceeded { kind: ItemKind, max: u32 },

    #[error("item quantity must be positive")]
    ZeroQuantity,

    #[error("item {id} is already held")]
    DuplicateItemId { id: ItemId },

    #[error("item cannot be deleted")]
    DeleteNotAllowed,

    #[error("container does not allow equipping")]
    EquipNotAllowed,

    #[error("{kind} items cannot be equipped")]
    NotEquippable { kind: ItemKind },

    #[error("item {id} is already equipped")]
    AlreadyEquipped { id: ItemId },

    #[error("item {id} is not equipped")]
    NotEquipped { id: ItemId },

    #[error("{kind} already has {max} equipped")]
    MaxEquippedReached { kind: ItemKind, max: u32 },

    #[error("{kind} requires at least {min} equipped")]
    MinEquippedViolated { kind: ItemKind, min: u32 },

    #[error("source container does not allow swapping out")]
    SwapOutNotAllowed,

    #[error("destination container does not allow swapping in")]
    SwapInNotAllowed,

    #[error("swaps between two containers of this kind are not allowed")]
    SameKindSwapNotAllowed,
}

/// Errors raised by [`super::Container`] operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContainerError {
    #[error("policy violation: {0}")]
    Violation(#[from] Violation),

    #[error("item {id} not found")]
    ItemNotFound { id: ItemId },

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

impl ContainerError {
    /// Returns the violated rule, if this is a policy violation.
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            ContainerError::Violation(violation) => Some(violation),
            _ => None,
        }
    }
}

impl InventoryError for ContainerError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ContainerError::Violation(_) => ErrorSeverity::Validation,
            ContainerError::ItemNotFound { .. } => ErrorSeverity::Validation,
            ContainerError::Policy(error) => error.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ContainerError::Violation(_) => "CONTAINER_POLICY_VIOLATION",
            ContainerError::ItemNotFound { .. } => "CONTAINER_ITEM_NOT_FOUND",
            ContainerError::Policy(error) => error.error_code(),
        }
    }
}
