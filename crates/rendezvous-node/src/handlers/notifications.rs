//! Logs every lifecycle notification published on the bus.

use shared_bus::{RendezvousEvent, Subscription};
use tracing::{info, warn};

pub struct NotificationLogger {
    subscription: Subscription,
}

impl NotificationLogger {
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    /// Runs until the bus is dropped. Returns how many events were logged.
    pub async fn run(mut self) -> u64 {
        let mut logged = 0;
        while let Some(event) = self.subscription.recv().await {
            log_event(&event);
            logged += 1;
        }
        logged
    }
}

fn log_event(event: &RendezvousEvent) {
    let payload = serde_json::to_string(event).unwrap_or_else(|e| format!("<unserializable: {e}>"));
    match event {
        RendezvousEvent::RequestInvalidated(_) | RendezvousEvent::ParticipantDisconnected(_) => {
            warn!(topic = ?event.topic(), %payload, "Rendezvous notification");
        }
        _ => info!(topic = ?event.topic(), %payload, "Rendezvous notification"),
    }
}
