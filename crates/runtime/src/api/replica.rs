//! Handle to one actor's replica session.
use tokio::sync::{broadcast, mpsc, oneshot};

use inventory_core::{
    ActorId, ContainerKind, ContainerSnapshot, OwnerId, RemoteRequest, ReplicaState, RequestKind,
    StateDigest, Upstream,
};

use super::errors::{Result, RuntimeError};
use super::handle::InventoryHandle;
use crate::events::ReplicaEvent;
use crate::workers::ReplicaCommand;

/// Client side of a connected remote actor.
///
/// Tracks containers replicated for `actor` and sends that actor's
/// requests upstream. Dropping every clone ends the session and
/// disconnects the actor.
#[derive(Clone)]
pub struct ReplicaHandle {
    actor: ActorId,
    command_tx: mpsc::Sender<ReplicaCommand>,
    events: broadcast::Sender<ReplicaEvent>,
    authority: InventoryHandle,
}

impl ReplicaHandle {
    pub(crate) fn new(
        actor: ActorId,
        command_tx: mpsc::Sender<ReplicaCommand>,
        events: broadcast::Sender<ReplicaEvent>,
        authority: InventoryHandle,
    ) -> Self {
        Self {
            actor,
            command_tx,
            events,
            authority,
        }
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    async fn query<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> ReplicaCommand) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::ReplicaChannelClosed)?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Start replicating `owner`'s container of `kind`.
    ///
    /// The replica begins unsynced and asks the authority for a full-state
    /// transfer; watch [`subscribe_events`](Self::subscribe_events) for
    /// `ReplicaEvent::Synced`. Returns `false` if already tracked.
    pub async fn track(&self, owner: OwnerId, kind: ContainerKind) -> Result<bool> {
        self.query(|reply| ReplicaCommand::Track { owner, kind, reply })
            .await?
    }

    pub async fn state(&self, owner: OwnerId) -> Result<Option<ReplicaState>> {
        self.query(|reply| ReplicaCommand::State { owner, reply })
            .await
    }

    /// Local copy of `owner`'s container, if tracked.
    pub async fn snapshot(&self, owner: OwnerId) -> Result<Option<ContainerSnapshot>> {
        let snapshot = self
            .query(|reply| ReplicaCommand::Snapshot { owner, reply })
            .await?;
        Ok(snapshot.map(|(snapshot, _)| snapshot))
    }

    pub async fn digest(&self, owner: OwnerId) -> Result<Option<StateDigest>> {
        let snapshot = self
            .query(|reply| ReplicaCommand::Snapshot { owner, reply })
            .await?;
        Ok(snapshot.map(|(_, digest)| digest))
    }

    /// Send a request as this actor. Fire-and-forget: the outcome arrives
    /// as replicated state, never as a reply.
    pub async fn request(&self, owner: OwnerId, kind: RequestKind) -> Result<()> {
        self.authority
            .send_upstream(self.actor, Upstream::Request(RemoteRequest { owner, kind }))
            .await
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ReplicaEvent> {
        self.events.subscribe()
    }
}
