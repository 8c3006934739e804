//! High-level runtime orchestrator.
//!
//! The runtime owns background workers, wires up command/event channels, and
//! exposes a builder-based API for hosting containers and connecting
//! replica sessions.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use inventory_core::{ActorId, BehaviorTables, InventoryConfig};

use crate::api::{InventoryHandle, ReplicaHandle, Result, RuntimeError};
use crate::events::{EventBus, InventoryEvent, ReplicaEvent};
use crate::repository::{ContainerRepository, InMemoryContainerRepo};
use crate::workers::{
    AuthorityWorker, Command, PersistenceWorker, RateLimiter, ReplicaCommand, ReplicaWorker,
};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command_buffer_size: usize,
    pub event_buffer_size: usize,
    /// Payload bytes per full-state segment.
    pub max_segment_bytes: usize,
    /// Remote mutation requests allowed per actor per window.
    pub mutation_quota: u32,
    /// Remote fetch requests allowed per actor per window.
    pub query_quota: u32,
    /// Replica resync requests allowed per actor per window.
    pub resync_quota: u32,
    pub rate_window: Duration,
    /// Run the persistence worker. Without it writes go nowhere.
    pub enable_persistence: bool,
    pub data_dir: PathBuf,
    pub policy_file: Option<PathBuf>,
    pub seed_file: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_buffer_size: 32,
            event_buffer_size: 100,
            max_segment_bytes: InventoryConfig::DEFAULT_MAX_SEGMENT_BYTES,
            mutation_quota: 20,
            query_quota: 5,
            resync_quota: 8,
            rate_window: Duration::from_secs(1),
            enable_persistence: true,
            data_dir: PathBuf::from("data/inventories"),
            policy_file: None,
            seed_file: None,
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// - `INVENTORY_COMMAND_BUFFER` / `INVENTORY_EVENT_BUFFER`
    /// - `INVENTORY_SEGMENT_BYTES`
    /// - `INVENTORY_MUTATION_QUOTA` / `INVENTORY_QUERY_QUOTA` / `INVENTORY_RESYNC_QUOTA`
    /// - `INVENTORY_RATE_WINDOW_MS`
    /// - `INVENTORY_PERSISTENCE`
    /// - `INVENTORY_DATA_DIR` / `INVENTORY_POLICY_FILE` / `INVENTORY_SEED_FILE`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(capacity) = read_env::<usize>("INVENTORY_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }
        if let Some(capacity) = read_env::<usize>("INVENTORY_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }
        if let Some(bytes) = read_env::<usize>("INVENTORY_SEGMENT_BYTES") {
            config.max_segment_bytes = bytes.max(1);
        }
        if let Some(quota) = read_env::<u32>("INVENTORY_MUTATION_QUOTA") {
            config.mutation_quota = quota;
        }
        if let Some(quota) = read_env::<u32>("INVENTORY_QUERY_QUOTA") {
            config.query_quota = quota;
        }
        if let Some(quota) = read_env::<u32>("INVENTORY_RESYNC_QUOTA") {
            config.resync_quota = quota;
        }
        if let Some(millis) = read_env::<u64>("INVENTORY_RATE_WINDOW_MS") {
            config.rate_window = Duration::from_millis(millis.max(1));
        }
        if let Some(enabled) = read_env_bool("INVENTORY_PERSISTENCE") {
            config.enable_persistence = enabled;
        }
        if let Some(dir) = read_env::<PathBuf>("INVENTORY_DATA_DIR") {
            config.data_dir = dir;
        }
        config.policy_file = read_env::<PathBuf>("INVENTORY_POLICY_FILE").or(config.policy_file);
        config.seed_file = read_env::<PathBuf>("INVENTORY_SEED_FILE").or(config.seed_file);

        config
    }

    /// Engine settings derived from this configuration.
    pub fn inventory_config(&self) -> InventoryConfig {
        InventoryConfig::with_max_segment_bytes(self.max_segment_bytes)
    }

    pub(crate) fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(
            self.rate_window,
            self.mutation_quota,
            self.query_quota,
            self.resync_quota,
        )
    }
}

/// Main runtime that hosts authoritative containers
///
/// Runtime owns workers and coordinates startup and shutdown.
/// [`InventoryHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: InventoryHandle,
    config: RuntimeConfig,
    tables: Arc<BehaviorTables>,

    // Background workers
    authority_worker_handle: JoinHandle<()>,
    persistence_worker_handle: Option<JoinHandle<()>>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> InventoryHandle {
        self.handle.clone()
    }

    pub fn tables(&self) -> &Arc<BehaviorTables> {
        &self.tables
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Subscribe to every authority event
    pub fn subscribe_events(&self) -> broadcast::Receiver<InventoryEvent> {
        self.handle.subscribe_events()
    }

    /// Connect `actor` as a remote peer and start its replica session.
    ///
    /// Authority traffic for the actor flows over an in-process channel into
    /// a dedicated replica worker. Connecting an actor again replaces its
    /// previous session. The session ends when every clone of the returned
    /// handle is dropped.
    pub async fn connect_replica(&self, actor: ActorId) -> Result<ReplicaHandle> {
        let (downstream_tx, downstream_rx) = mpsc::unbounded_channel();
        let session = self.handle.connect(actor, downstream_tx).await?;

        let (command_tx, command_rx) =
            mpsc::channel::<ReplicaCommand>(self.config.command_buffer_size);
        let (event_tx, _event_rx) =
            broadcast::channel::<ReplicaEvent>(self.config.event_buffer_size);

        let worker = ReplicaWorker::new(
            actor,
            session,
            Arc::clone(&self.tables),
            downstream_rx,
            command_rx,
            self.handle.clone(),
            event_tx.clone(),
        );
        tokio::spawn(async move {
            worker.run().await;
        });

        debug!(target: "runtime::replica", %actor, session = session.0, "Replica session connected");
        Ok(ReplicaHandle::new(actor, command_tx, event_tx, self.handle.clone()))
    }

    /// Shutdown the runtime gracefully
    ///
    /// Stops the authority, then waits for the persistence worker to write
    /// every queued save.
    pub async fn shutdown(self) -> Result<()> {
        if self.handle.shutdown().await.is_err() {
            debug!(target: "runtime::authority", "Authority already stopped");
        }
        drop(self.handle);

        self.authority_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        if let Some(persistence_handle) = self.persistence_worker_handle {
            persistence_handle.await.map_err(RuntimeError::WorkerJoin)?;
        }

        info!(target: "runtime::authority", "Runtime shut down");
        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    tables: Option<Arc<BehaviorTables>>,
    repository: Option<Arc<dyn ContainerRepository>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            tables: None,
            repository: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Behavior tables for every hosted container.
    ///
    /// Defaults to [`BehaviorTables::standard`].
    pub fn tables(mut self, tables: Arc<BehaviorTables>) -> Self {
        self.tables = Some(tables);
        self
    }

    /// Storage for hosted containers.
    ///
    /// Defaults to an empty [`InMemoryContainerRepo`].
    pub fn repository(mut self, repository: Arc<dyn ContainerRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Enable or disable the persistence worker
    pub fn enable_persistence(mut self, enable: bool) -> Self {
        self.config.enable_persistence = enable;
        self
    }

    /// Spawn the workers and return the running runtime.
    pub async fn start(self) -> Result<Runtime> {
        let tables = self
            .tables
            .unwrap_or_else(|| Arc::new(BehaviorTables::standard()));
        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(InMemoryContainerRepo::new()));

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let handle = InventoryHandle::new(command_tx, event_bus.clone());

        // Persistence worker (if enabled)
        let (persistence_tx, persistence_worker_handle) = if self.config.enable_persistence {
            let (job_tx, job_rx) = mpsc::unbounded_channel();
            let worker = PersistenceWorker::new(Arc::clone(&repository), job_rx);
            let join = tokio::spawn(async move {
                worker.run().await;
            });
            (Some(job_tx), Some(join))
        } else {
            (None, None)
        };

        let authority = AuthorityWorker::new(
            Arc::clone(&tables),
            self.config.inventory_config(),
            repository,
            self.config.rate_limiter(),
            command_rx,
            event_bus,
            persistence_tx,
        );
        let authority_worker_handle = tokio::spawn(async move {
            authority.run().await;
        });

        Ok(Runtime {
            handle,
            config: self.config,
            tables,
            authority_worker_handle,
            persistence_worker_handle,
        })
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_env_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
