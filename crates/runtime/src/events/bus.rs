//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast;

use super::types::InventoryEvent;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Topic {
    /// Committed batches and destroyed containers
    Changes,
    /// Rejected mutations and dropped remote requests
    Requests,
    /// Full-state transfers served to replicas
    Transfers,
    /// Access grants and revocations
    Access,
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::Changes,
        Topic::Requests,
        Topic::Transfers,
        Topic::Access,
    ];
}

/// Topic-based event bus
///
/// Every event goes to its topic channel and to the combined channel, so
/// consumers can follow one topic or everything. Publishing never blocks;
/// slow receivers lag and skip.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<HashMap<Topic, broadcast::Sender<InventoryEvent>>>,
    all: broadcast::Sender<InventoryEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let channels = Topic::ALL
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity).0))
            .collect();

        Self {
            channels: Arc::new(channels),
            all: broadcast::channel(capacity).0,
        }
    }

    /// Publish an event to its topic and the combined stream
    pub fn publish(&self, event: InventoryEvent) {
        let topic = event.topic();

        if let Some(tx) = self.channels.get(&topic)
            && tx.send(event.clone()).is_err()
        {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
        let _ = self.all.send(event);
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<InventoryEvent> {
        match self.channels.get(&topic) {
            Some(tx) => tx.subscribe(),
            // Every topic is created in `with_capacity`.
            None => self.all.subscribe(),
        }
    }

    /// Subscribe to every event regardless of topic
    pub fn subscribe_all(&self) -> broadcast::Receiver<InventoryEvent> {
        self.all.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
