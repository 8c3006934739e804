//! Worker tasks that back the runtime orchestration.
//!
//! The authority worker owns every hosted container and serializes all
//! mutations; the persistence worker writes committed state off that path,
//! and one replica worker runs per connected remote actor.

mod authority;
mod persistence;
mod rate_limit;
mod replica;

pub use authority::{AuthorityWorker, Command, DownstreamSender, SessionId};
pub use persistence::{PersistenceJob, PersistenceWorker};
pub use rate_limit::RateLimiter;
pub use replica::{ReplicaCommand, ReplicaWorker};
