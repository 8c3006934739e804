use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use inventory_core::{
    ContainerKind, ContainerSnapshot, DefaultInventories, Item, ItemKind, OwnerId, SeedItem,
    Subkind,
};
use inventory_runtime::repository::Result as RepoResult;
use inventory_runtime::{
    ContainerRepository, FileContainerRepository, InMemoryContainerRepo, RepositoryError, Runtime,
    RuntimeConfig,
};

fn seeds() -> DefaultInventories {
    DefaultInventories::empty(ContainerKind::PlayerInventory).with_seed(
        ContainerKind::PlayerInventory,
        vec![SeedItem::new(ItemKind::Currency, Subkind(0), 100)],
    )
}

/// Memory store whose deletes take a while to land.
struct SlowDeletes {
    inner: InMemoryContainerRepo,
    delay: Duration,
}

#[async_trait]
impl ContainerRepository for SlowDeletes {
    async fn load(&self, owner: OwnerId) -> RepoResult<Option<ContainerSnapshot>> {
        self.inner.load(owner).await
    }

    async fn save(&self, snapshot: &ContainerSnapshot) -> RepoResult<()> {
        self.inner.save(snapshot).await
    }

    async fn create_default(
        &self,
        owner: OwnerId,
        kind: ContainerKind,
    ) -> RepoResult<ContainerSnapshot> {
        self.inner.create_default(owner, kind).await
    }

    async fn delete(&self, owner: OwnerId) -> RepoResult<bool> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete(owner).await
    }

    fn default_kind(&self) -> ContainerKind {
        self.inner.default_kind()
    }
}

async fn start(dir: &std::path::Path) -> Runtime {
    let repository = FileContainerRepository::new(dir, seeds()).expect("repository opens");
    Runtime::builder()
        .config(RuntimeConfig::default())
        .repository(Arc::new(repository))
        .start()
        .await
        .expect("runtime starts")
}

#[tokio::test]
async fn committed_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let owner = OwnerId(7);

    let runtime = start(dir.path()).await;
    let handle = runtime.handle();
    handle
        .provision(owner, ContainerKind::PlayerInventory)
        .await
        .unwrap();
    let rug = Item::new(ItemKind::Furniture, Subkind(11), 1);
    let rug_id = rug.id;
    handle.add_item(owner, rug).await.unwrap();
    let digest = handle.digest(owner).await.unwrap();
    handle.flush().await.unwrap();
    runtime.shutdown().await.unwrap();

    let restarted = start(dir.path()).await;
    let handle = restarted.handle();
    let snapshot = handle.snapshot(owner).await.unwrap();
    assert!(snapshot.items.iter().any(|item| item.id == rug_id));
    assert_eq!(handle.digest(owner).await.unwrap(), digest);
    restarted.shutdown().await.unwrap();
}

#[tokio::test]
async fn destroyed_container_is_deleted_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let owner = OwnerId(8);

    let runtime = start(dir.path()).await;
    let handle = runtime.handle();
    handle
        .provision(owner, ContainerKind::PlayerInventory)
        .await
        .unwrap();
    handle
        .add_item(owner, Item::new(ItemKind::Furniture, Subkind(1), 1))
        .await
        .unwrap();
    assert!(handle.destroy(owner).await.unwrap());
    handle.flush().await.unwrap();
    runtime.shutdown().await.unwrap();

    let repository = FileContainerRepository::new(dir.path(), seeds()).unwrap();
    assert!(repository.load(owner).await.unwrap().is_none());
}

#[tokio::test]
async fn reprovision_during_pending_delete_starts_fresh() {
    let repository = Arc::new(SlowDeletes {
        inner: InMemoryContainerRepo::with_defaults(seeds()),
        delay: Duration::from_millis(200),
    });
    let runtime = Runtime::builder()
        .config(RuntimeConfig::default())
        .repository(repository.clone())
        .start()
        .await
        .expect("runtime starts");
    let handle = runtime.handle();
    let owner = OwnerId(9);

    handle
        .provision(owner, ContainerKind::PlayerInventory)
        .await
        .unwrap();
    let rug = Item::new(ItemKind::Furniture, Subkind(11), 1);
    let rug_id = rug.id;
    handle.add_item(owner, rug).await.unwrap();
    handle.flush().await.unwrap();

    // No flush between destroy and the next touch.
    assert!(handle.destroy(owner).await.unwrap());
    let fresh = handle
        .provision(owner, ContainerKind::PlayerInventory)
        .await
        .unwrap();
    assert!(fresh.items.iter().all(|item| item.id != rug_id));
    assert_eq!(fresh.items.len(), 1);

    // Once the delete has run, storage and the hosted copy agree.
    handle.flush().await.unwrap();
    let stored = repository.load(owner).await.unwrap().expect("fresh state saved");
    assert_eq!(stored, fresh);
    assert_eq!(handle.snapshot(owner).await.unwrap(), fresh);

    // A second destroy after the first delete finished removes it for good.
    assert!(handle.destroy(owner).await.unwrap());
    handle.flush().await.unwrap();
    assert!(repository.load(owner).await.unwrap().is_none());

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn file_repository_round_trips_and_detects_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let repository = FileContainerRepository::new(dir.path().join("nested"), seeds()).unwrap();
    assert_eq!(repository.default_kind(), ContainerKind::PlayerInventory);

    assert!(repository.load(OwnerId(1)).await.unwrap().is_none());
    let created = repository
        .create_default(OwnerId(1), ContainerKind::PlayerInventory)
        .await
        .unwrap();
    assert_eq!(created.items.len(), 1);
    assert_eq!(repository.load(OwnerId(1)).await.unwrap(), Some(created));
    assert!(repository.exists(OwnerId(1)).await.unwrap());

    // A file stored under the wrong owner is rejected.
    let foreign = ContainerSnapshot::empty(OwnerId(3), ContainerKind::Mailbox);
    repository.save(&foreign).await.unwrap();
    std::fs::rename(
        repository.base_dir().join("container_3.bin"),
        repository.base_dir().join("container_4.bin"),
    )
    .unwrap();
    assert!(matches!(
        repository.load(OwnerId(4)).await,
        Err(RepositoryError::CorruptedData { .. })
    ));

    std::fs::write(repository.base_dir().join("container_5.bin"), b"\x01").unwrap();
    assert!(matches!(
        repository.load(OwnerId(5)).await,
        Err(RepositoryError::Serialization(_))
    ));

    assert!(repository.delete(OwnerId(1)).await.unwrap());
    assert!(!repository.delete(OwnerId(1)).await.unwrap());
}
