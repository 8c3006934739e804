//! Scripted authority/replica session.
//!
//! A shop grants a player a lamp and a coat through the trusted handle; the
//! player's client then moves the lamp into a shared chest and back with
//! remote requests, wears the coat, and cleans up. Every step waits until
//! the player's replicas agree with the authority.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use inventory_core::{
    AccessLevel, ActorId, ContainerKind, ContainerSnapshot, Item, ItemKind, ItemTuple, OwnerId,
    RequestKind, Subkind,
};
use inventory_runtime::{InventoryHandle, ReplicaEvent, ReplicaHandle, Runtime};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::timeout;

const PLAYER: ActorId = ActorId(1);
const CHEST: OwnerId = OwnerId(1_000);
const SYNC_TIMEOUT: Duration = Duration::from_secs(5);

/// One replica session plus the event stream it reports on.
struct Session {
    authority: InventoryHandle,
    replica: ReplicaHandle,
    events: broadcast::Receiver<ReplicaEvent>,
}

impl Session {
    /// Waits until the replica of `owner` is synced and satisfies `done`.
    async fn wait_for(
        &mut self,
        owner: OwnerId,
        what: &str,
        done: impl FnMut(&ContainerSnapshot) -> bool,
    ) -> Result<ContainerSnapshot> {
        timeout(SYNC_TIMEOUT, self.poll_until(owner, what, done))
            .await
            .with_context(|| format!("Timed out waiting for {what}"))?
    }

    async fn poll_until(
        &mut self,
        owner: OwnerId,
        what: &str,
        mut done: impl FnMut(&ContainerSnapshot) -> bool,
    ) -> Result<ContainerSnapshot> {
        loop {
            let synced = matches!(
                self.replica.state(owner).await?,
                Some(inventory_core::ReplicaState::Synced)
            );
            if synced
                && let Some(snapshot) = self.replica.snapshot(owner).await?
                && done(&snapshot)
            {
                return Ok(snapshot);
            }
            match self.events.recv().await {
                Ok(ReplicaEvent::Resyncing { owner, reason, .. }) => {
                    tracing::warn!("Replica of {} resyncing: {}", owner, reason.as_str());
                }
                Ok(ReplicaEvent::Closed { owner: closed }) if closed == owner => {
                    bail!("{} was closed while waiting for {}", owner, what)
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => bail!("replica session ended"),
            }
        }
    }

    /// Checks that the replica digest of `owner` equals the authority's.
    async fn verify(&self, owner: OwnerId) -> Result<()> {
        let authority = self.authority.digest(owner).await?;
        let replica = self.replica.digest(owner).await?;
        if replica != Some(authority) {
            bail!("replica of {} diverged from the authority", owner);
        }
        tracing::info!("{} converged at digest {}", owner, authority.short());
        Ok(())
    }
}

pub async fn run(runtime: &Runtime) -> Result<()> {
    let authority = runtime.handle();
    let personal = OwnerId::from(PLAYER);

    // Containers
    let player = authority
        .provision(personal, ContainerKind::PlayerInventory)
        .await?;
    tracing::info!("{} holds {} items", personal, player.items.len());
    authority
        .provision(CHEST, ContainerKind::SharedChest)
        .await?;
    authority.grant(CHEST, PLAYER, AccessLevel::Use).await?;

    // Replica session for the player's client
    let replica = runtime.connect_replica(PLAYER).await?;
    let mut session = Session {
        authority: authority.clone(),
        events: replica.subscribe_events(),
        replica,
    };
    session
        .replica
        .track(personal, ContainerKind::PlayerInventory)
        .await?;
    session
        .replica
        .track(CHEST, ContainerKind::SharedChest)
        .await?;
    session.wait_for(personal, "initial sync", |_| true).await?;
    session.wait_for(CHEST, "chest sync", |_| true).await?;

    // Trusted grants from the shop
    let lamp = Item::new(ItemKind::Furniture, Subkind(21), 1);
    let coat = Item::new(ItemKind::Clothing, Subkind(8), 1);
    let (lamp_id, coat_id) = (lamp.id, coat.id);
    let lamp_tuple = ItemTuple::from(&lamp);
    authority.add_item(personal, lamp).await?;
    authority.add_item(personal, coat).await?;
    session
        .wait_for(personal, "shop grant", |snapshot| {
            snapshot.items.iter().any(|item| item.id == coat_id)
        })
        .await?;

    // Remote moves through the chest
    session
        .replica
        .request(CHEST, RequestKind::AddItem(lamp_tuple.clone()))
        .await?;
    session
        .wait_for(CHEST, "lamp in chest", |snapshot| {
            snapshot.items.iter().any(|item| item.id == lamp_id)
        })
        .await?;
    session
        .replica
        .request(CHEST, RequestKind::TakeItem(lamp_tuple))
        .await?;
    session
        .wait_for(CHEST, "lamp taken back", |snapshot| {
            snapshot.items.iter().all(|item| item.id != lamp_id)
        })
        .await?;

    // Wear the coat
    authority.equip_item(personal, coat_id).await?;
    let dressed = session
        .wait_for(personal, "coat equipped", |snapshot| {
            snapshot.equipped.contains(&coat_id)
        })
        .await?;
    tracing::info!(
        "{} state:\n{}",
        personal,
        serde_json::to_string_pretty(&dressed).context("Failed to render snapshot")?
    );

    // Clean up so repeated runs start from the same state
    authority.unequip_item(personal, coat_id).await?;
    authority.remove_item(personal, coat_id, false).await?;
    authority.remove_item(personal, lamp_id, false).await?;
    session
        .wait_for(personal, "cleanup", |snapshot| {
            snapshot
                .items
                .iter()
                .all(|item| item.id != coat_id && item.id != lamp_id)
        })
        .await?;

    session.verify(personal).await?;
    session.verify(CHEST).await?;
    authority.flush().await?;
    Ok(())
}
