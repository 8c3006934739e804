//! Replica session of one remote actor.
//!
//! Holds a [`ReplicaEndpoint`] per tracked container, feeds it the
//! authority's downstream traffic in arrival order, and answers divergence
//! with `Upstream::Resync`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use inventory_core::{
    ActorId, BehaviorTables, ContainerKind, ContainerSnapshot, Downstream, OwnerId,
    ReplicaEndpoint, ReplicaOutcome, ReplicaState, StateDigest,
};

use super::SessionId;
use crate::api::{InventoryHandle, Result};
use crate::events::ReplicaEvent;

/// Commands understood by a replica worker.
pub enum ReplicaCommand {
    /// Start replicating `owner`; replies `false` if already tracked.
    Track {
        owner: OwnerId,
        kind: ContainerKind,
        reply: oneshot::Sender<Result<bool>>,
    },
    State {
        owner: OwnerId,
        reply: oneshot::Sender<Option<ReplicaState>>,
    },
    Snapshot {
        owner: OwnerId,
        reply: oneshot::Sender<Option<(ContainerSnapshot, StateDigest)>>,
    },
}

pub struct ReplicaWorker {
    actor: ActorId,
    session: SessionId,
    tables: Arc<BehaviorTables>,
    replicas: HashMap<OwnerId, ReplicaEndpoint>,
    downstream_rx: mpsc::UnboundedReceiver<Downstream>,
    command_rx: mpsc::Receiver<ReplicaCommand>,
    authority: InventoryHandle,
    events: broadcast::Sender<ReplicaEvent>,
}

impl ReplicaWorker {
    pub fn new(
        actor: ActorId,
        session: SessionId,
        tables: Arc<BehaviorTables>,
        downstream_rx: mpsc::UnboundedReceiver<Downstream>,
        command_rx: mpsc::Receiver<ReplicaCommand>,
        authority: InventoryHandle,
        events: broadcast::Sender<ReplicaEvent>,
    ) -> Self {
        Self {
            actor,
            session,
            tables,
            replicas: HashMap::new(),
            downstream_rx,
            command_rx,
            authority,
            events,
        }
    }

    pub async fn run(mut self) {
        info!(target: "runtime::replica", actor = %self.actor, session = self.session.0, "ReplicaWorker started");

        loop {
            tokio::select! {
                Some(message) = self.downstream_rx.recv() => {
                    self.handle_downstream(message).await;
                }
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    // Every handle was dropped.
                    None => break,
                },
            }
        }

        match self.authority.disconnect(self.actor, self.session).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(target: "runtime::replica", actor = %self.actor, session = self.session.0, "Session already replaced");
            }
            Err(e) => {
                debug!(target: "runtime::replica", actor = %self.actor, error = %e, "Disconnect not delivered");
            }
        }
        info!(
            target: "runtime::replica",
            actor = %self.actor,
            tracked = self.replicas.len(),
            "ReplicaWorker stopped"
        );
    }

    async fn handle_command(&mut self, cmd: ReplicaCommand) {
        match cmd {
            ReplicaCommand::Track { owner, kind, reply } => {
                let result = self.track(owner, kind).await;
                let _ = reply.send(result);
            }
            ReplicaCommand::State { owner, reply } => {
                let _ = reply.send(self.replicas.get(&owner).map(ReplicaEndpoint::state));
            }
            ReplicaCommand::Snapshot { owner, reply } => {
                let snapshot = self
                    .replicas
                    .get(&owner)
                    .map(|replica| (replica.container().snapshot(), replica.digest()));
                let _ = reply.send(snapshot);
            }
        }
    }

    async fn track(&mut self, owner: OwnerId, kind: ContainerKind) -> Result<bool> {
        if self.replicas.contains_key(&owner) {
            return Ok(false);
        }
        let (replica, resync) = ReplicaEndpoint::new(owner, kind, Arc::clone(&self.tables))?;
        self.replicas.insert(owner, replica);
        debug!(target: "runtime::replica", actor = %self.actor, %owner, %kind, "Tracking container");
        self.authority.send_upstream(self.actor, resync).await?;
        Ok(true)
    }

    async fn handle_downstream(&mut self, message: Downstream) {
        let owner = message.owner();
        if let Downstream::Closed { owner } = message {
            if self.replicas.remove(&owner).is_some() {
                info!(target: "runtime::replica", actor = %self.actor, %owner, "Container closed by authority");
                let _ = self.events.send(ReplicaEvent::Closed { owner });
            }
            return;
        }

        let Some(replica) = self.replicas.get_mut(&owner) else {
            debug!(target: "runtime::replica", actor = %self.actor, %owner, "Traffic for untracked container");
            return;
        };
        let outcome = match message {
            Downstream::Delta(push) => replica.handle_delta(&push),
            Downstream::Segment(segment) => replica.handle_segment(segment),
            Downstream::Closed { .. } => return,
        };

        match outcome {
            ReplicaOutcome::Applied | ReplicaOutcome::Installed => {
                let digest = replica.digest();
                let _ = self.events.send(ReplicaEvent::Synced { owner, digest });
            }
            ReplicaOutcome::Buffered { received, count } => {
                debug!(target: "runtime::replica", %owner, received, count, "Segment buffered");
            }
            ReplicaOutcome::Ignored => {
                debug!(target: "runtime::replica", %owner, "Stale message ignored");
            }
            ReplicaOutcome::ResyncRequested { transfer, reason } => {
                let request = inventory_core::Upstream::Resync { owner, transfer };
                if let Err(e) = self.authority.send_upstream(self.actor, request).await {
                    warn!(target: "runtime::replica", %owner, %transfer, error = %e, "Resync request not delivered");
                }
                let _ = self.events.send(ReplicaEvent::Resyncing {
                    owner,
                    transfer,
                    reason,
                });
            }
        }
    }
}
