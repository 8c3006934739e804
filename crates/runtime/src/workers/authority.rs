//! Authority worker that owns every hosted [`inventory_core::Container`].
//!
//! All mutations, local or remote, are serialized through this one task, so
//! a container never has two writers. Committed batches are pushed to
//! subscribed replicas, announced on the event bus, and handed to the
//! persistence worker without waiting for the write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::oneshot::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use inventory_core::{
    AccessController, AccessLevel, ActorId, AuthorityEndpoint, BehaviorTables, Container,
    ContainerError, ContainerKind, ContainerSnapshot, Downstream, InventoryConfig, Item, ItemId,
    ItemQuery, OwnerId, RemoteRequest, RequestClass, RequestKind, StateDigest, TransferId,
    Upstream,
};

use super::persistence::PersistenceJob;
use super::rate_limit::RateLimiter;
use crate::api::{Result, RuntimeError};
use crate::events::{DropReason, EventBus, InventoryEvent};
use crate::repository::ContainerRepository;

/// Channel carrying authority traffic to one connected actor.
pub type DownstreamSender = mpsc::UnboundedSender<Downstream>;

type Reply<T> = oneshot::Sender<Result<T>>;

/// Identifies one connection of an actor. A reconnect gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

/// Commands that can be sent to the authority worker
pub enum Command {
    /// Load or create `owner`'s container as `kind`.
    Provision {
        owner: OwnerId,
        kind: ContainerKind,
        reply: Reply<ContainerSnapshot>,
    },
    AddItem {
        owner: OwnerId,
        item: Item,
        reply: Reply<()>,
    },
    RemoveItem {
        owner: OwnerId,
        id: ItemId,
        manual: bool,
        reply: Reply<()>,
    },
    EquipItem {
        owner: OwnerId,
        id: ItemId,
        reply: Reply<()>,
    },
    UnequipItem {
        owner: OwnerId,
        id: ItemId,
        reply: Reply<()>,
    },
    SwapItem {
        from: OwnerId,
        to: OwnerId,
        id: ItemId,
        reply: Reply<()>,
    },
    /// Dry-run of `SwapItem`.
    CheckSwap {
        from: OwnerId,
        to: OwnerId,
        id: ItemId,
        reply: Reply<()>,
    },
    FindItems {
        owner: OwnerId,
        query: ItemQuery,
        reply: Reply<Vec<Item>>,
    },
    Snapshot {
        owner: OwnerId,
        reply: Reply<(ContainerSnapshot, StateDigest)>,
    },
    Grant {
        owner: OwnerId,
        actor: ActorId,
        level: AccessLevel,
        reply: Reply<Option<AccessLevel>>,
    },
    Revoke {
        owner: OwnerId,
        actor: ActorId,
        reply: Reply<Option<AccessLevel>>,
    },
    /// Register the transport channel of a remote actor.
    Connect {
        actor: ActorId,
        sender: DownstreamSender,
        reply: Reply<SessionId>,
    },
    /// Tear down `session`; ignored if the actor has reconnected since.
    Disconnect {
        actor: ActorId,
        session: SessionId,
        reply: Reply<bool>,
    },
    /// Subscribe a connected actor to `owner`'s deltas.
    Subscribe {
        actor: ActorId,
        owner: OwnerId,
        reply: Reply<bool>,
    },
    /// Untrusted traffic from a remote actor. Never answered directly.
    Upstream { actor: ActorId, message: Upstream },
    Destroy {
        owner: OwnerId,
        reply: Reply<bool>,
    },
    /// Replies once every save queued so far has been written.
    Flush { reply: oneshot::Sender<()> },
    Shutdown,
}

/// Authority-side state of one container.
struct Hosted {
    container: Container,
    access: AccessController,
    endpoint: AuthorityEndpoint,
}

/// Live transport channel of a connected actor.
struct Connection {
    session: SessionId,
    sender: DownstreamSender,
}

/// Background task that processes inventory commands.
pub struct AuthorityWorker {
    tables: Arc<BehaviorTables>,
    config: InventoryConfig,
    repository: Arc<dyn ContainerRepository>,
    hosted: HashMap<OwnerId, Hosted>,
    connections: HashMap<ActorId, Connection>,
    next_session: u64,
    /// Destroyed owners whose stored state may still be on disk.
    pending_deletes: HashMap<OwnerId, oneshot::Receiver<()>>,
    limiter: RateLimiter,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    persistence: Option<mpsc::UnboundedSender<PersistenceJob>>,
}

impl AuthorityWorker {
    pub fn new(
        tables: Arc<BehaviorTables>,
        config: InventoryConfig,
        repository: Arc<dyn ContainerRepository>,
        limiter: RateLimiter,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        persistence: Option<mpsc::UnboundedSender<PersistenceJob>>,
    ) -> Self {
        Self {
            tables,
            config,
            repository,
            hosted: HashMap::new(),
            connections: HashMap::new(),
            next_session: 1,
            pending_deletes: HashMap::new(),
            limiter,
            command_rx,
            event_bus,
            persistence,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        info!(
            target: "runtime::authority",
            max_segment_bytes = self.config.max_segment_bytes,
            persistence = self.persistence.is_some(),
            "AuthorityWorker started"
        );

        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    if matches!(cmd, Command::Shutdown) {
                        break;
                    }
                    self.handle_command(cmd).await;
                }
                else => break,
            }
        }

        info!(
            target: "runtime::authority",
            containers = self.hosted.len(),
            connections = self.connections.len(),
            "AuthorityWorker stopped"
        );
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Provision { owner, kind, reply } => {
                let result = self.provision(owner, kind).await;
                respond(reply, result, "Provision");
            }
            Command::AddItem { owner, item, reply } => {
                let result = self
                    .mutate(owner, "add_item", |container| container.add_item(item))
                    .await;
                respond(reply, result, "AddItem");
            }
            Command::RemoveItem {
                owner,
                id,
                manual,
                reply,
            } => {
                let result = self
                    .mutate(owner, "remove_item", |container| {
                        container.remove_item(id, manual)
                    })
                    .await;
                respond(reply, result, "RemoveItem");
            }
            Command::EquipItem { owner, id, reply } => {
                let result = self
                    .mutate(owner, "equip_item", |container| container.equip_item(id))
                    .await;
                respond(reply, result, "EquipItem");
            }
            Command::UnequipItem { owner, id, reply } => {
                let result = self
                    .mutate(owner, "unequip_item", |container| container.unequip_item(id))
                    .await;
                respond(reply, result, "UnequipItem");
            }
            Command::SwapItem {
                from,
                to,
                id,
                reply,
            } => {
                let result = self.swap(from, to, id).await;
                respond(reply, result, "SwapItem");
            }
            Command::CheckSwap {
                from,
                to,
                id,
                reply,
            } => {
                let result = self.check_swap(from, to, id).await;
                respond(reply, result, "CheckSwap");
            }
            Command::FindItems {
                owner,
                query,
                reply,
            } => {
                let result = self.with_container(owner, |container| {
                    container.find_items(query).into_iter().cloned().collect()
                });
                respond(reply, result.await, "FindItems");
            }
            Command::Snapshot { owner, reply } => {
                let result = self.with_container(owner, |container| {
                    (container.snapshot(), container.digest())
                });
                respond(reply, result.await, "Snapshot");
            }
            Command::Grant {
                owner,
                actor,
                level,
                reply,
            } => {
                let result = self
                    .update_access(owner, |access| access.grant(actor, level))
                    .await;
                if result.is_ok() {
                    self.access_changed(owner, actor, Some(level));
                }
                respond(reply, result, "Grant");
            }
            Command::Revoke {
                owner,
                actor,
                reply,
            } => {
                let result = self
                    .update_access(owner, |access| access.revoke(actor))
                    .await;
                if let Ok(Some(_)) = result {
                    self.access_changed(owner, actor, None);
                }
                respond(reply, result, "Revoke");
            }
            Command::Connect {
                actor,
                sender,
                reply,
            } => {
                let session = self.connect(actor, sender);
                respond(reply, Ok(session), "Connect");
            }
            Command::Disconnect {
                actor,
                session,
                reply,
            } => {
                let disconnected = self.disconnect(actor, session);
                respond(reply, Ok(disconnected), "Disconnect");
            }
            Command::Subscribe {
                actor,
                owner,
                reply,
            } => {
                let result = self.subscribe(actor, owner).await;
                respond(reply, result, "Subscribe");
            }
            Command::Upstream { actor, message } => self.handle_upstream(actor, message).await,
            Command::Destroy { owner, reply } => {
                let result = self.destroy(owner).await;
                respond(reply, result, "Destroy");
            }
            Command::Flush { reply } => match &self.persistence {
                Some(persistence) => {
                    if let Err(mpsc::error::SendError(job)) =
                        persistence.send(PersistenceJob::Flush { reply })
                        && let PersistenceJob::Flush { reply } = job
                    {
                        warn!(target: "runtime::authority", "Persistence worker gone; flushing nothing");
                        let _ = reply.send(());
                    }
                }
                None => {
                    let _ = reply.send(());
                }
            },
            Command::Shutdown => {}
        }
    }

    // ===== container lifecycle =====

    /// Makes sure `owner`'s container is hosted, loading it or creating it
    /// from the seed table (as `kind`, or the repository default).
    async fn ensure_loaded(&mut self, owner: OwnerId, kind: Option<ContainerKind>) -> Result<()> {
        if self.hosted.contains_key(&owner) {
            return Ok(());
        }

        // Storage still holds the destroyed state until the queued delete
        // runs, so skip it and queue a save that lands after the delete.
        let recreated = self.delete_pending(owner);
        let snapshot = if recreated {
            let kind = kind.unwrap_or_else(|| self.repository.default_kind());
            info!(target: "runtime::authority", %owner, %kind, "Recreating container while its delete is pending");
            self.repository.create_default(owner, kind).await?
        } else {
            match self.repository.load(owner).await? {
                Some(snapshot) => snapshot,
                None => {
                    let kind = kind.unwrap_or_else(|| self.repository.default_kind());
                    info!(target: "runtime::authority", %owner, %kind, "Provisioning new container");
                    self.repository.create_default(owner, kind).await?
                }
            }
        };

        let container = Container::from_snapshot(snapshot, Arc::clone(&self.tables))?;
        if recreated {
            self.queue_save(container.snapshot());
        }
        debug!(
            target: "runtime::authority",
            %owner,
            kind = %container.kind(),
            items = container.item_count(),
            digest = %container.digest().short(),
            "Container loaded"
        );
        self.hosted.insert(
            owner,
            Hosted {
                container,
                access: AccessController::new(owner),
                endpoint: AuthorityEndpoint::new(owner, &self.config),
            },
        );
        Ok(())
    }

    /// Whether a queued delete of `owner` has not run yet.
    fn delete_pending(&mut self, owner: OwnerId) -> bool {
        let Some(done) = self.pending_deletes.get_mut(&owner) else {
            return false;
        };
        if matches!(done.try_recv(), Err(TryRecvError::Empty)) {
            return true;
        }
        self.pending_deletes.remove(&owner);
        false
    }

    fn queue_save(&self, snapshot: ContainerSnapshot) {
        if let Some(persistence) = &self.persistence
            && persistence.send(PersistenceJob::Save(snapshot)).is_err()
        {
            error!(target: "runtime::authority", "Persistence worker gone; save dropped");
        }
    }

    /// Queues a delete behind any pending save of the same container and
    /// remembers it until the persistence worker reports back.
    fn queue_delete(&mut self, owner: OwnerId) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let (done, pending) = oneshot::channel();
        if persistence
            .send(PersistenceJob::Delete { owner, done })
            .is_err()
        {
            error!(target: "runtime::authority", %owner, "Persistence worker gone; delete dropped");
            return;
        }
        self.pending_deletes
            .retain(|_, done| matches!(done.try_recv(), Err(TryRecvError::Empty)));
        self.pending_deletes.insert(owner, pending);
    }

    fn hosted(&self, owner: OwnerId) -> Result<&Hosted> {
        self.hosted
            .get(&owner)
            .ok_or(RuntimeError::UnknownContainer { owner })
    }

    fn hosted_mut(&mut self, owner: OwnerId) -> Result<&mut Hosted> {
        self.hosted
            .get_mut(&owner)
            .ok_or(RuntimeError::UnknownContainer { owner })
    }

    async fn provision(&mut self, owner: OwnerId, kind: ContainerKind) -> Result<ContainerSnapshot> {
        self.ensure_loaded(owner, Some(kind)).await?;
        let container = &self.hosted(owner)?.container;
        if container.kind() != kind {
            return Err(RuntimeError::KindMismatch {
                owner,
                existing: container.kind(),
                requested: kind,
            });
        }
        Ok(container.snapshot())
    }

    async fn with_container<T>(
        &mut self,
        owner: OwnerId,
        read: impl FnOnce(&Container) -> T,
    ) -> Result<T> {
        self.ensure_loaded(owner, None).await?;
        Ok(read(&self.hosted(owner)?.container))
    }

    async fn update_access<T>(
        &mut self,
        owner: OwnerId,
        update: impl FnOnce(&mut AccessController) -> T,
    ) -> Result<T> {
        self.ensure_loaded(owner, None).await?;
        Ok(update(&mut self.hosted_mut(owner)?.access))
    }

    async fn destroy(&mut self, owner: OwnerId) -> Result<bool> {
        let hosted = self.hosted.remove(&owner);
        let was_hosted = hosted.is_some();
        if let Some(hosted) = hosted {
            for actor in hosted.endpoint.subscribers() {
                deliver(&mut self.connections, actor, Downstream::Closed { owner });
            }
        }

        let stored = if self.persistence.is_some() {
            let stored = !self.delete_pending(owner) && self.repository.exists(owner).await?;
            self.queue_delete(owner);
            stored
        } else {
            self.repository.delete(owner).await?
        };

        if was_hosted || stored {
            info!(target: "runtime::authority", %owner, "Container destroyed");
            self.event_bus.publish(InventoryEvent::Destroyed { owner });
        }
        Ok(was_hosted || stored)
    }

    // ===== mutations =====

    async fn mutate(
        &mut self,
        owner: OwnerId,
        operation: &'static str,
        apply: impl FnOnce(&mut Container) -> std::result::Result<(), ContainerError>,
    ) -> Result<()> {
        self.ensure_loaded(owner, None).await?;
        let hosted = self.hosted_mut(owner)?;
        if let Err(error) = apply(&mut hosted.container) {
            self.reject(owner, operation, &error);
            return Err(error.into());
        }
        self.publish_changes(owner);
        Ok(())
    }

    async fn swap(&mut self, from: OwnerId, to: OwnerId, id: ItemId) -> Result<()> {
        if from == to {
            return Err(RuntimeError::SameContainer { owner: from });
        }
        self.ensure_loaded(from, None).await?;
        self.ensure_loaded(to, None).await?;

        let mut source = self
            .hosted
            .remove(&from)
            .ok_or(RuntimeError::UnknownContainer { owner: from })?;
        let result = match self.hosted.get_mut(&to) {
            Some(destination) => source
                .container
                .swap_item_to(&mut destination.container, id)
                .map_err(RuntimeError::from),
            None => Err(RuntimeError::UnknownContainer { owner: to }),
        };
        self.hosted.insert(from, source);

        match result {
            Ok(()) => {
                self.publish_changes(from);
                self.publish_changes(to);
                Ok(())
            }
            Err(RuntimeError::Container(error)) => {
                self.reject(from, "swap_item", &error);
                Err(error.into())
            }
            Err(error) => Err(error),
        }
    }

    async fn check_swap(&mut self, from: OwnerId, to: OwnerId, id: ItemId) -> Result<()> {
        if from == to {
            return Err(RuntimeError::SameContainer { owner: from });
        }
        self.ensure_loaded(from, None).await?;
        self.ensure_loaded(to, None).await?;

        let source = &self.hosted(from)?.container;
        let destination = &self.hosted(to)?.container;
        source.check_swap_to(destination, id)?;
        Ok(())
    }

    fn reject(&self, owner: OwnerId, operation: &'static str, error: &ContainerError) {
        debug!(
            target: "runtime::authority",
            %owner,
            operation,
            error = %error,
            "Mutation rejected"
        );
        self.event_bus.publish(InventoryEvent::Rejected {
            owner,
            operation,
            error: error.clone(),
        });
    }

    /// Drains the committed records of `owner` and fans them out.
    fn publish_changes(&mut self, owner: OwnerId) {
        let Some(hosted) = self.hosted.get_mut(&owner) else {
            return;
        };
        let records = hosted.container.drain_changes();
        if records.is_empty() {
            return;
        }

        let digest = hosted.container.digest();
        let revision = hosted.container.revision();
        let publication = hosted.endpoint.publish(&records, digest, &hosted.access);

        for actor in &publication.suppressed {
            debug!(target: "runtime::authority", %owner, %actor, "Delta suppressed (no view access)");
        }
        for (actor, push) in publication.pushes {
            deliver(&mut self.connections, actor, Downstream::Delta(push));
        }

        let snapshot = hosted.container.snapshot();
        self.queue_save(snapshot);
        debug!(
            target: "runtime::authority",
            %owner,
            revision,
            records = records.len(),
            digest = %digest.short(),
            "Batch committed"
        );
        self.event_bus.publish(InventoryEvent::Changed {
            owner,
            revision,
            digest,
            records,
        });
    }

    // ===== replication =====

    async fn subscribe(&mut self, actor: ActorId, owner: OwnerId) -> Result<bool> {
        self.ensure_loaded(owner, None).await?;
        let hosted = self.hosted_mut(owner)?;
        hosted.access.check_view(actor)?;
        Ok(hosted.endpoint.subscribe(actor))
    }

    /// Registers a new connection for `actor`, replacing any earlier one.
    ///
    /// Subscriptions and transfer ids belong to a connection, so the new
    /// session starts with none.
    fn connect(&mut self, actor: ActorId, sender: DownstreamSender) -> SessionId {
        let session = SessionId(self.next_session);
        self.next_session += 1;
        if let Some(previous) = self.connections.insert(actor, Connection { session, sender }) {
            debug!(target: "runtime::authority", %actor, previous = previous.session.0, "Replaced existing connection");
        }
        self.drop_subscriptions(actor);
        debug!(target: "runtime::authority", %actor, session = session.0, "Actor connected");
        session
    }

    fn disconnect(&mut self, actor: ActorId, session: SessionId) -> bool {
        match self.connections.get(&actor) {
            Some(connection) if connection.session == session => {}
            _ => {
                debug!(target: "runtime::authority", %actor, session = session.0, "Stale disconnect ignored");
                return false;
            }
        }
        self.connections.remove(&actor);
        self.drop_subscriptions(actor);
        self.limiter.forget(actor);
        debug!(target: "runtime::authority", %actor, session = session.0, "Actor disconnected");
        true
    }

    fn drop_subscriptions(&mut self, actor: ActorId) {
        for hosted in self.hosted.values_mut() {
            hosted.endpoint.unsubscribe(actor);
        }
    }

    fn access_changed(&self, owner: OwnerId, actor: ActorId, level: Option<AccessLevel>) {
        debug!(target: "runtime::authority", %owner, %actor, ?level, "Access changed");
        self.event_bus.publish(InventoryEvent::AccessChanged {
            owner,
            actor,
            level,
        });
    }

    async fn handle_upstream(&mut self, actor: ActorId, message: Upstream) {
        let class = message.class();
        match message {
            Upstream::Resync { owner, transfer } => {
                if !self.limiter.check(actor, class, Instant::now()) {
                    self.drop_request(actor, owner, "resync", DropReason::RateLimited);
                    return;
                }
                if let Err(reason) = self.admit(actor, owner, class).await {
                    self.drop_request(actor, owner, "resync", reason);
                    return;
                }
                self.serve_transfer(actor, owner, Some(transfer));
            }
            Upstream::Request(request) => self.handle_request(actor, request).await,
        }
    }

    async fn handle_request(&mut self, actor: ActorId, request: RemoteRequest) {
        let RemoteRequest { owner, kind } = request;
        let name = kind.as_str();

        if !self.limiter.check(actor, kind.class(), Instant::now()) {
            self.drop_request(actor, owner, name, DropReason::RateLimited);
            return;
        }
        if let Err(reason) = self.admit(actor, owner, kind.class()).await {
            self.drop_request(actor, owner, name, reason);
            return;
        }

        let personal = OwnerId::from(actor);
        let result = match kind {
            RequestKind::AddItem(item) | RequestKind::TakeItem(item) if personal == owner => {
                debug!(target: "runtime::authority", %actor, item = %item.id(), "Move within own container");
                self.drop_request(actor, owner, name, DropReason::InvalidTarget);
                return;
            }
            RequestKind::AddItem(item) => self.swap(personal, owner, item.id()).await,
            RequestKind::TakeItem(item) => self.swap(owner, personal, item.id()).await,
            RequestKind::DeleteItem(item) => {
                let id = item.id();
                self.mutate(owner, "delete_item", |container| container.remove_item(id, true))
                    .await
            }
            RequestKind::FetchInventory => {
                self.serve_transfer(actor, owner, None);
                Ok(())
            }
        };

        if let Err(error) = result {
            debug!(
                target: "runtime::authority",
                %actor,
                %owner,
                request = name,
                error = %error,
                "Remote request failed"
            );
        }
    }

    /// Loads the target and checks the access the request class needs.
    async fn admit(
        &mut self,
        actor: ActorId,
        owner: OwnerId,
        class: RequestClass,
    ) -> std::result::Result<(), DropReason> {
        if let Err(error) = self.ensure_loaded(owner, None).await {
            warn!(target: "runtime::authority", %owner, error = %error, "Request target unavailable");
            return Err(DropReason::Unavailable);
        }
        let access = &self.hosted.get(&owner).ok_or(DropReason::Unavailable)?.access;
        let checked = match class {
            RequestClass::Mutation => access.check_use(actor),
            RequestClass::Query | RequestClass::Resync => access.check_view(actor),
        };
        checked.map_err(|denied| {
            debug!(target: "runtime::authority", %denied, "Access denied");
            DropReason::AccessDenied
        })
    }

    fn drop_request(
        &self,
        actor: ActorId,
        owner: OwnerId,
        request: &'static str,
        reason: DropReason,
    ) {
        debug!(
            target: "runtime::authority",
            %actor,
            %owner,
            request,
            reason = reason.as_str(),
            "Remote request dropped"
        );
        self.event_bus.publish(InventoryEvent::RequestDropped {
            actor,
            owner,
            request,
            reason,
        });
    }

    /// Sends the full state of `owner` to `actor` in segments.
    ///
    /// `requested` carries the replica's transfer id for a resync; `None`
    /// starts an authority-initiated transfer.
    fn serve_transfer(&mut self, actor: ActorId, owner: OwnerId, requested: Option<TransferId>) {
        let Some(hosted) = self.hosted.get_mut(&owner) else {
            return;
        };
        let Some(transfer) = hosted.endpoint.begin_transfer(actor, requested) else {
            debug!(target: "runtime::authority", %actor, %owner, "Duplicate resync request ignored");
            return;
        };

        let segments = match hosted.endpoint.full_state_transfer(&hosted.container, transfer) {
            Ok(segments) => segments,
            Err(e) => {
                error!(target: "runtime::authority", %owner, %transfer, error = %e, "Failed to encode container");
                return;
            }
        };

        let count = segments.len();
        for segment in segments {
            deliver(&mut self.connections, actor, Downstream::Segment(segment));
        }
        debug!(target: "runtime::authority", %actor, %owner, %transfer, segments = count, "Full-state transfer served");
        self.event_bus.publish(InventoryEvent::TransferServed {
            actor,
            owner,
            transfer,
            segments: count,
        });
    }
}

/// Pushes one message to a connected actor, dropping dead connections.
fn deliver(connections: &mut HashMap<ActorId, Connection>, actor: ActorId, message: Downstream) {
    let Some(connection) = connections.get(&actor) else {
        debug!(target: "runtime::authority", %actor, "No connection for subscriber");
        return;
    };
    if connection.sender.send(message).is_err() {
        debug!(target: "runtime::authority", %actor, "Connection closed; removing");
        connections.remove(&actor);
    }
}

fn respond<T>(reply: Reply<T>, result: Result<T>, command: &'static str) {
    if reply.send(result).is_err() {
        debug!(target: "runtime::authority", command, "Reply channel closed (caller dropped)");
    }
}
