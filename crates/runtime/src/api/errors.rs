//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, repositories, and the core
//! engine so clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use inventory_core::{
    AccessDenied, ContainerError, ContainerKind, ErrorSeverity, InventoryError, OwnerId,
    ProtocolError,
};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("authority worker command channel closed")]
    CommandChannelClosed,

    #[error("authority worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("replica worker channel closed")]
    ReplicaChannelClosed,

    #[error("worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),

    #[error("{owner} holds a {existing} container, not a {requested}")]
    KindMismatch {
        owner: OwnerId,
        existing: ContainerKind,
        requested: ContainerKind,
    },

    #[error("{owner} cannot transfer an item to itself")]
    SameContainer { owner: OwnerId },

    #[error("no container tracked for {owner}")]
    UnknownContainer { owner: OwnerId },
}

impl RuntimeError {
    /// Returns the container error behind this failure, if any.
    pub fn container_error(&self) -> Option<&ContainerError> {
        match self {
            RuntimeError::Container(error) => Some(error),
            _ => None,
        }
    }
}

impl InventoryError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            RuntimeError::Repository(error) => error.severity(),
            RuntimeError::Container(error) => error.severity(),
            RuntimeError::Protocol(error) => error.severity(),
            RuntimeError::AccessDenied(error) => error.severity(),
            RuntimeError::KindMismatch { .. }
            | RuntimeError::SameContainer { .. }
            | RuntimeError::UnknownContainer { .. } => ErrorSeverity::Validation,
            RuntimeError::CommandChannelClosed
            | RuntimeError::ReplyChannelClosed(_)
            | RuntimeError::ReplicaChannelClosed
            | RuntimeError::WorkerJoin(_) => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RuntimeError::CommandChannelClosed => "RUNTIME_COMMAND_CHANNEL_CLOSED",
            RuntimeError::ReplyChannelClosed(_) => "RUNTIME_REPLY_CHANNEL_CLOSED",
            RuntimeError::ReplicaChannelClosed => "RUNTIME_REPLICA_CHANNEL_CLOSED",
            RuntimeError::WorkerJoin(_) => "RUNTIME_WORKER_JOIN",
            RuntimeError::Repository(error) => error.error_code(),
            RuntimeError::Container(error) => error.error_code(),
            RuntimeError::Protocol(error) => error.error_code(),
            RuntimeError::AccessDenied(error) => error.error_code(),
            RuntimeError::KindMismatch { .. } => "RUNTIME_KIND_MISMATCH",
            RuntimeError::SameContainer { .. } => "RUNTIME_SAME_CONTAINER",
            RuntimeError::UnknownContainer { .. } => "RUNTIME_UNKNOWN_CONTAINER",
        }
    }
}
