// src/core/events.rs

//! Defines the event bus that publishes cluster lifecycle events to observers
//! (operator tooling, tests, a future metrics exporter).

use crate::core::member::MemberId;
use tokio::sync::broadcast::{self, Receiver, Sender};

/// The capacity of the broadcast channel. Generous enough to absorb a burst of
/// quarantine events from a single resize without lagging a slow subscriber.
const EVENT_BUS_CAPACITY: usize = 1024;

/// A single observable occurrence in a cluster's lifecycle.
#[derive(Debug, Clone)]
pub enum ClusterEvent {
    /// A member failed to start and was moved into quarantine.
    EntityQuarantined { member: MemberId, reason: String },
    /// A sub-location was newly classified as failed.
    ZoneFailed { zone: String },
    /// A previously-failed sub-location recovered.
    ZoneRecovered { zone: String },
    /// A resize operation completed (successfully or not) at a new size.
    ResizeCompleted { new_size: usize },
}

/// The `EventBus` is the central distribution hub for cluster lifecycle events.
///
/// Modeled on the teacher's `core::events::EventBus`: a single broadcast channel that any
/// number of observers can subscribe to, with no backpressure on the publisher.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<ClusterEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { sender }
    }

    /// Publishes an event to all current subscribers. It is fine if there are none.
    pub fn publish(&self, event: ClusterEvent) {
        let _ = self.sender.send(event);
    }

    /// Provides a new receiver for an observer to subscribe to the event stream.
    pub fn subscribe(&self) -> Receiver<ClusterEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
