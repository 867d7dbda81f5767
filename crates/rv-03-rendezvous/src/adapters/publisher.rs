//! Notification publisher over the shared bus.

use shared_bus::{EventPublisher, InMemoryEventBus, RendezvousEvent};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::trace;

/// Publishes lifecycle notifications.
///
/// `publish` awaits delivery on the caller's task; `dispatch` hands the
/// event to the runtime and returns at once, for callers that must not
/// block (the expiry worker thread).
#[derive(Clone)]
pub struct NotificationPublisher {
    bus: Arc<InMemoryEventBus>,
    runtime: Handle,
}

impl NotificationPublisher {
    #[must_use]
    pub fn new(bus: Arc<InMemoryEventBus>, runtime: Handle) -> Self {
        Self { bus, runtime }
    }

    #[must_use]
    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    #[must_use]
    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub async fn publish(&self, event: RendezvousEvent) -> usize {
        self.bus.publish(event).await
    }

    /// Publish from any thread without waiting.
    pub fn dispatch(&self, event: RendezvousEvent) {
        let bus = self.bus.clone();
        trace!(topic = ?event.topic(), "Dispatching notification");
        self.runtime.spawn(async move {
            bus.publish(event).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::{EventFilter, EventTopic};
    use shared_types::ParticipantId;
    use std::time::Duration;

    #[tokio::test]
    async fn test_dispatch_from_plain_thread() {
        let bus = Arc::new(InMemoryEventBus::new());
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Presence]));
        let publisher = NotificationPublisher::new(bus.clone(), Handle::current());
        let who = ParticipantId::random();

        let worker = publisher.clone();
        std::thread::spawn(move || worker.dispatch(RendezvousEvent::ParticipantDisconnected(who)))
            .join()
            .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(1), sub.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event, RendezvousEvent::ParticipantDisconnected(id) if id == who));
        assert_eq!(bus.events_published(), 1);
    }
}
