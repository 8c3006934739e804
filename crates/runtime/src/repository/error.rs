//! Error types raised by repository implementations.

use inventory_core::{ErrorSeverity, InventoryError, OwnerId};
use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("container repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupted data for {owner}: {reason}")]
    CorruptedData { owner: OwnerId, reason: String },
}

impl InventoryError for RepositoryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            RepositoryError::LockPoisoned => ErrorSeverity::Fatal,
            _ => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RepositoryError::LockPoisoned => "REPOSITORY_LOCK_POISONED",
            RepositoryError::Io(_) => "REPOSITORY_IO",
            RepositoryError::Serialization(_) => "REPOSITORY_SERIALIZATION",
            RepositoryError::CorruptedData { .. } => "REPOSITORY_CORRUPTED",
        }
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
