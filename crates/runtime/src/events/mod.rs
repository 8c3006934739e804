//! Topic-based event bus for runtime events.
//!
//! Events are published to specific topics, and consumers can subscribe only
//! to the topics they need or to the combined stream.

mod bus;
mod types;

pub use bus::{EventBus, Topic};
pub use types::{DropReason, InventoryEvent, ReplicaEvent};
