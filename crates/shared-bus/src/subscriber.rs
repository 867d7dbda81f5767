//! Receiving side of the bus.

use crate::events::{EventFilter, RendezvousEvent};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

/// One listener's view of the bus: every notification published after it
/// was created, narrowed by its filter.
pub struct Subscription {
    receiver: broadcast::Receiver<RendezvousEvent>,
    filter: EventFilter,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<RendezvousEvent>, filter: EventFilter) -> Self {
        Self { receiver, filter }
    }

    /// Next matching notification; `None` once the bus is gone.
    ///
    /// A listener that falls more than the channel capacity behind loses the
    /// oldest notifications and carries on with the rest.
    pub async fn recv(&mut self) -> Option<RendezvousEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, filter = ?self.filter, "Listener fell behind; notifications lost");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
