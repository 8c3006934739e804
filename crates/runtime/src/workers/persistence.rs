//! Persistence worker that writes committed container state.
//!
//! The authority enqueues a job after every committed batch and moves on;
//! this worker drains the queue in order and writes through the repository.
//! Because jobs are ordered, a `Flush` reply means every earlier job has
//! been attempted.

use std::sync::Arc;

use inventory_core::{ContainerSnapshot, OwnerId};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::repository::ContainerRepository;

/// Jobs accepted by the persistence worker.
pub enum PersistenceJob {
    Save(ContainerSnapshot),
    /// Deletes stored state, then signals `done` whether or not it succeeded.
    Delete {
        owner: OwnerId,
        done: oneshot::Sender<()>,
    },
    /// Replies once every job queued before it has been handled.
    Flush { reply: oneshot::Sender<()> },
}

/// Background worker that handles all repository writes.
pub struct PersistenceWorker {
    repository: Arc<dyn ContainerRepository>,
    job_rx: mpsc::UnboundedReceiver<PersistenceJob>,
    saved: u64,
    failed: u64,
}

impl PersistenceWorker {
    pub fn new(
        repository: Arc<dyn ContainerRepository>,
        job_rx: mpsc::UnboundedReceiver<PersistenceJob>,
    ) -> Self {
        Self {
            repository,
            job_rx,
            saved: 0,
            failed: 0,
        }
    }

    /// Main worker loop. Ends when the authority drops its sender.
    pub async fn run(mut self) {
        info!(target: "runtime::persistence", "PersistenceWorker started");

        while let Some(job) = self.job_rx.recv().await {
            self.handle_job(job).await;
        }

        info!(
            target: "runtime::persistence",
            saved = self.saved,
            failed = self.failed,
            "PersistenceWorker stopped"
        );
    }

    async fn handle_job(&mut self, job: PersistenceJob) {
        match job {
            PersistenceJob::Save(snapshot) => {
                let owner = snapshot.owner;
                match self.repository.save(&snapshot).await {
                    Ok(()) => {
                        self.saved += 1;
                        debug!(target: "runtime::persistence", %owner, "Container saved");
                    }
                    Err(e) => {
                        self.failed += 1;
                        error!(target: "runtime::persistence", %owner, error = %e, "Failed to save container");
                    }
                }
            }
            PersistenceJob::Delete { owner, done } => {
                match self.repository.delete(owner).await {
                    Ok(existed) => {
                        debug!(target: "runtime::persistence", %owner, existed, "Container deleted");
                    }
                    Err(e) => {
                        self.failed += 1;
                        error!(target: "runtime::persistence", %owner, error = %e, "Failed to delete container");
                    }
                }
                let _ = done.send(());
            }
            PersistenceJob::Flush { reply } => {
                if reply.send(()).is_err() {
                    debug!(target: "runtime::persistence", "Flush reply channel closed (caller dropped)");
                }
            }
        }
    }
}
