//! Repository contract for loading and saving container state.

use async_trait::async_trait;
use inventory_core::{ContainerKind, ContainerSnapshot, OwnerId};

use super::Result;

/// Key-value store of container snapshots keyed by owner.
///
/// The authority loads a container on first use and falls back to
/// [`ContainerRepository::create_default`] when nothing is stored yet. Saves
/// arrive from the persistence worker after each committed batch.
#[async_trait]
pub trait ContainerRepository: Send + Sync {
    /// Load the stored state of `owner`'s container, if any.
    async fn load(&self, owner: OwnerId) -> Result<Option<ContainerSnapshot>>;

    /// Store (or overwrite) a container's state.
    async fn save(&self, snapshot: &ContainerSnapshot) -> Result<()>;

    /// Provision a new container from the seed table and store it.
    async fn create_default(&self, owner: OwnerId, kind: ContainerKind)
    -> Result<ContainerSnapshot>;

    /// Delete a stored container. Returns `false` if nothing was stored.
    async fn delete(&self, owner: OwnerId) -> Result<bool>;

    /// Kind created for an owner nobody provisioned explicitly.
    fn default_kind(&self) -> ContainerKind;

    async fn exists(&self, owner: OwnerId) -> Result<bool> {
        Ok(self.load(owner).await?.is_some())
    }
}
