//! In-memory ContainerRepository implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use inventory_core::{ContainerKind, ContainerSnapshot, DefaultInventories, OwnerId};

use crate::repository::{ContainerRepository, RepositoryError, Result};

/// In-memory implementation of ContainerRepository.
///
/// Stores snapshots keyed by owner for testing and local development.
pub struct InMemoryContainerRepo {
    containers: RwLock<HashMap<OwnerId, ContainerSnapshot>>,
    defaults: DefaultInventories,
}

impl InMemoryContainerRepo {
    /// Create an empty repository that provisions empty containers.
    pub fn new() -> Self {
        Self::with_defaults(DefaultInventories::default())
    }

    /// Create an empty repository that provisions from `defaults`.
    pub fn with_defaults(defaults: DefaultInventories) -> Self {
        Self {
            containers: RwLock::new(HashMap::new()),
            defaults,
        }
    }

    /// Number of stored containers.
    pub fn len(&self) -> usize {
        self.containers
            .read()
            .map(|containers| containers.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryContainerRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRepository for InMemoryContainerRepo {
    async fn load(&self, owner: OwnerId) -> Result<Option<ContainerSnapshot>> {
        let containers = self
            .containers
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(containers.get(&owner).cloned())
    }

    async fn save(&self, snapshot: &ContainerSnapshot) -> Result<()> {
        let mut containers = self
            .containers
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        containers.insert(snapshot.owner, snapshot.clone());
        Ok(())
    }

    async fn create_default(
        &self,
        owner: OwnerId,
        kind: ContainerKind,
    ) -> Result<ContainerSnapshot> {
        let snapshot = self.defaults.snapshot(owner, kind);
        self.save(&snapshot).await?;
        Ok(snapshot)
    }

    async fn delete(&self, owner: OwnerId) -> Result<bool> {
        let mut containers = self
            .containers
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(containers.remove(&owner).is_some())
    }

    fn default_kind(&self) -> ContainerKind {
        self.defaults.default_kind()
    }
}
