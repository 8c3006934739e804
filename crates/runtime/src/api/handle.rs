//! Cloneable façade for issuing commands to the authority.
//!
//! [`InventoryHandle`] hides channel plumbing and offers one async helper per
//! container operation, plus topic subscriptions on the event bus.
use tokio::sync::{broadcast, mpsc, oneshot};

use inventory_core::{
    AccessLevel, ActorId, ContainerKind, ContainerSnapshot, Downstream, Item, ItemId, ItemQuery,
    OwnerId, StateDigest, Upstream,
};

use super::errors::{Result, RuntimeError};
use crate::events::{EventBus, InventoryEvent, Topic};
use crate::workers::{Command, SessionId};

/// Client-facing handle to the authority worker
#[derive(Clone)]
pub struct InventoryHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl InventoryHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Sends a command built around a fresh reply channel and awaits the answer.
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(build(reply_tx)).await?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Load `owner`'s container, creating it from the seed table as `kind`
    /// if it does not exist yet.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::KindMismatch`] if the stored container has another kind.
    pub async fn provision(&self, owner: OwnerId, kind: ContainerKind) -> Result<ContainerSnapshot> {
        self.request(|reply| Command::Provision { owner, kind, reply })
            .await
    }

    pub async fn add_item(&self, owner: OwnerId, item: Item) -> Result<()> {
        self.request(|reply| Command::AddItem { owner, item, reply })
            .await
    }

    /// Remove an item. `manual` marks a player-initiated delete, which the
    /// item's `can_delete` policy may forbid.
    pub async fn remove_item(&self, owner: OwnerId, id: ItemId, manual: bool) -> Result<()> {
        self.request(|reply| Command::RemoveItem {
            owner,
            id,
            manual,
            reply,
        })
        .await
    }

    pub async fn equip_item(&self, owner: OwnerId, id: ItemId) -> Result<()> {
        self.request(|reply| Command::EquipItem { owner, id, reply })
            .await
    }

    pub async fn unequip_item(&self, owner: OwnerId, id: ItemId) -> Result<()> {
        self.request(|reply| Command::UnequipItem { owner, id, reply })
            .await
    }

    /// Move an item from one container to another as a single transfer.
    pub async fn swap_item(&self, from: OwnerId, to: OwnerId, id: ItemId) -> Result<()> {
        self.request(|reply| Command::SwapItem { from, to, id, reply })
            .await
    }

    /// Whether [`swap_item`](Self::swap_item) would succeed right now.
    ///
    /// Validation failures yield `Ok(false)`; channel and storage failures
    /// are still errors.
    pub async fn can_swap_item(&self, from: OwnerId, to: OwnerId, id: ItemId) -> Result<bool> {
        match self
            .request(|reply| Command::CheckSwap { from, to, id, reply })
            .await
        {
            Ok(()) => Ok(true),
            Err(RuntimeError::Container(_) | RuntimeError::SameContainer { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn find_items(
        &self,
        owner: OwnerId,
        query: impl Into<ItemQuery>,
    ) -> Result<Vec<Item>> {
        let query = query.into();
        self.request(|reply| Command::FindItems {
            owner,
            query,
            reply,
        })
        .await
    }

    /// Query the current state of a container (read-only snapshot)
    pub async fn snapshot(&self, owner: OwnerId) -> Result<ContainerSnapshot> {
        let (snapshot, _) = self
            .request(|reply| Command::Snapshot { owner, reply })
            .await?;
        Ok(snapshot)
    }

    pub async fn digest(&self, owner: OwnerId) -> Result<StateDigest> {
        let (_, digest) = self
            .request(|reply| Command::Snapshot { owner, reply })
            .await?;
        Ok(digest)
    }

    /// Grant `actor` access to `owner`'s container; returns the previous level.
    pub async fn grant(
        &self,
        owner: OwnerId,
        actor: ActorId,
        level: AccessLevel,
    ) -> Result<Option<AccessLevel>> {
        self.request(|reply| Command::Grant {
            owner,
            actor,
            level,
            reply,
        })
        .await
    }

    pub async fn revoke(&self, owner: OwnerId, actor: ActorId) -> Result<Option<AccessLevel>> {
        self.request(|reply| Command::Revoke {
            owner,
            actor,
            reply,
        })
        .await
    }

    /// Register a remote actor's downstream channel.
    ///
    /// Replaces any earlier channel of the same actor; the new session
    /// starts without subscriptions.
    pub async fn connect(
        &self,
        actor: ActorId,
        sender: mpsc::UnboundedSender<Downstream>,
    ) -> Result<SessionId> {
        self.request(|reply| Command::Connect {
            actor,
            sender,
            reply,
        })
        .await
    }

    /// Drop an actor's channel, subscriptions and rate-limit counters.
    ///
    /// Returns `false` if `session` is no longer the actor's live
    /// connection, in which case nothing changes.
    pub async fn disconnect(&self, actor: ActorId, session: SessionId) -> Result<bool> {
        self.request(|reply| Command::Disconnect {
            actor,
            session,
            reply,
        })
        .await
    }

    /// Subscribe a connected actor to deltas of `owner`. Requires view access.
    pub async fn subscribe_replica(&self, actor: ActorId, owner: OwnerId) -> Result<bool> {
        self.request(|reply| Command::Subscribe {
            actor,
            owner,
            reply,
        })
        .await
    }

    /// Hand a message received from a remote actor to the authority.
    ///
    /// Remote traffic is never answered; its effects show up downstream
    /// and on the event bus.
    pub async fn send_upstream(&self, actor: ActorId, message: Upstream) -> Result<()> {
        self.send(Command::Upstream { actor, message }).await
    }

    /// Destroy a container, closing it for every subscriber.
    ///
    /// Returns `false` if nothing was hosted or stored for `owner`.
    pub async fn destroy(&self, owner: OwnerId) -> Result<bool> {
        self.request(|reply| Command::Destroy { owner, reply })
            .await
    }

    /// Wait until every save queued so far has been written.
    pub async fn flush(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Flush { reply: reply_tx }).await?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    pub(crate) async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Changes` - Committed batches and destroyed containers
    /// - `Topic::Requests` - Rejected mutations and dropped remote requests
    /// - `Topic::Transfers` - Full-state transfers served to replicas
    /// - `Topic::Access` - Access grants and revocations
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<InventoryEvent> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to every authority event
    pub fn subscribe_events(&self) -> broadcast::Receiver<InventoryEvent> {
        self.event_bus.subscribe_all()
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
