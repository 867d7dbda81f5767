//! Sending side of the bus.

use crate::events::{EventFilter, RendezvousEvent};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::trace;

/// Anything the rendezvous core can hand a lifecycle notification to.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish to every current listener. Returns how many received it.
    async fn publish(&self, event: RendezvousEvent) -> usize;

    /// Notifications accepted since the bus was created.
    fn events_published(&self) -> u64;
}

/// Single-process bus over a tokio broadcast channel.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<RendezvousEvent>,
    published: AtomicU64,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: AtomicU64::new(0),
        }
    }

    /// Listen for notifications matching `filter`, starting now.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        Subscription::new(self.sender.subscribe(), filter)
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: RendezvousEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        let topic = event.topic();
        // An empty bus is not an error; the notification is simply unheard.
        let delivered = self.sender.send(event).unwrap_or(0);
        trace!(?topic, delivered, "Published notification");
        delivered
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
