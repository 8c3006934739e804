//! File-based ContainerRepository implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use inventory_core::{ContainerKind, ContainerSnapshot, DefaultInventories, OwnerId};
use tokio::fs;

use crate::repository::{ContainerRepository, RepositoryError, Result};

/// File-based implementation of ContainerRepository.
///
/// Stores each container as `container_{owner}.bin` in bincode format.
/// Writes go to a temp file first and are renamed into place, so a crash
/// never leaves a half-written container behind.
pub struct FileContainerRepository {
    base_dir: PathBuf,
    defaults: DefaultInventories,
}

impl FileContainerRepository {
    /// Create a repository rooted at `base_dir`, creating the directory.
    pub fn new(base_dir: impl AsRef<Path>, defaults: DefaultInventories) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir, defaults })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn container_path(&self, owner: OwnerId) -> PathBuf {
        self.base_dir.join(format!("container_{}.bin", owner.0))
    }
}

#[async_trait]
impl ContainerRepository for FileContainerRepository {
    async fn load(&self, owner: OwnerId) -> Result<Option<ContainerSnapshot>> {
        let path = self.container_path(owner);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        let snapshot: ContainerSnapshot = bincode::deserialize(&bytes)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        if snapshot.owner != owner {
            return Err(RepositoryError::CorruptedData {
                owner,
                reason: format!("file holds {}", snapshot.owner),
            });
        }

        tracing::debug!(
            target: "runtime::repository",
            %owner,
            items = snapshot.items.len(),
            "Loaded container from {}",
            path.display()
        );
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &ContainerSnapshot) -> Result<()> {
        let path = self.container_path(snapshot.owner);
        let temp_path = path.with_extension("bin.tmp");

        let bytes = bincode::serialize(snapshot)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        fs::write(&temp_path, bytes).await?;
        fs::rename(&temp_path, &path).await?;

        tracing::debug!(
            target: "runtime::repository",
            owner = %snapshot.owner,
            "Saved container to {}",
            path.display()
        );
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
        match fs::remove_file(self.container_path(owner)).await {
            Ok(()) => {
                tracing::debug!(target: "runtime::repository", %owner, "Deleted container");
                Ok(true)
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    fn default_kind(&self) -> ContainerKind {
        self.defaults.default_kind()
    }
}
