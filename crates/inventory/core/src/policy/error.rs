use crate::error::{ErrorSeverity, InventoryError};
use crate::item::{ContainerKind, ItemKind};

/// Lookup failures against [`super::BehaviorTables`].
///
/// A missing policy is a configuration bug; the runtime refuses to start with
/// incomplete tables instead of masking lookups at request time.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("no container policy registered for {kind}")]
    UndefinedContainerPolicy { kind: ContainerKind },

    #[error("no item policy registered for {kind}")]
    UndefinedItemPolicy { kind: ItemKind },

    #[error("behavior tables incomplete (containers: {containers:?}, items: {items:?})")]
    IncompleteTables {
        containers: Vec<ContainerKind>,
        items: Vec<ItemKind>,
    },
}

impl InventoryError for PolicyError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            PolicyError::UndefinedContainerPolicy { .. } => "POLICY_UNDEFINED_CONTAINER",
            PolicyError::UndefinedItemPolicy { .. } => "POLICY_UNDEFINED_ITEM",
            PolicyError::IncompleteTables { .. } => "POLICY_INCOMPLETE_TABLES",
        }
    }
}
