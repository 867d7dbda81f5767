//! # Rendezvous Events
//!
//! All notifications that flow through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::{ParticipantId, RequestSnapshot};

/// All events that can be published to the event bus.
///
/// Resolution events carry the snapshot taken right after the terminal
/// transition, so `request.state` always names the winning state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RendezvousEvent {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================
    /// A request passed all creation checks and is now registered.
    RequestCreated(RequestSnapshot),

    // =========================================================================
    // RESOLUTION
    // =========================================================================
    /// The target accepted; the rendezvous effect has been attempted.
    RequestAccepted(RequestSnapshot),

    /// The target denied.
    RequestDenied(RequestSnapshot),

    /// The initiator withdrew the request.
    RequestCancelled(RequestSnapshot),

    /// The request outlived its TTL.
    RequestExpired(RequestSnapshot),

    /// One side disappeared; `request.state` is `InitiatorOffline` or
    /// `TargetOffline`.
    RequestInvalidated(RequestSnapshot),

    // =========================================================================
    // PRESENCE
    // =========================================================================
    /// A participant session ended.
    ParticipantDisconnected(ParticipantId),
}

impl RendezvousEvent {
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::RequestCreated(_) => EventTopic::Lifecycle,
            Self::RequestAccepted(_)
            | Self::RequestDenied(_)
            | Self::RequestCancelled(_)
            | Self::RequestExpired(_)
            | Self::RequestInvalidated(_) => EventTopic::Resolution,
            Self::ParticipantDisconnected(_) => EventTopic::Presence,
        }
    }

    /// The request this event is about, if any.
    #[must_use]
    pub fn request(&self) -> Option<&RequestSnapshot> {
        match self {
            Self::RequestCreated(r)
            | Self::RequestAccepted(r)
            | Self::RequestDenied(r)
            | Self::RequestCancelled(r)
            | Self::RequestExpired(r)
            | Self::RequestInvalidated(r) => Some(r),
            Self::ParticipantDisconnected(_) => None,
        }
    }

    /// Whether `participant` is one of the parties this event concerns.
    #[must_use]
    pub fn involves(&self, participant: &ParticipantId) -> bool {
        match self {
            Self::ParticipantDisconnected(id) => id == participant,
            other => other
                .request()
                .is_some_and(|r| &r.initiator == participant || &r.target == participant),
        }
    }
}

/// Event topics for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Request creation.
    Lifecycle,
    /// Any terminal transition.
    Resolution,
    /// Participant sessions coming and going.
    Presence,
    /// Wildcard.
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to receive; empty means every topic.
    pub topics: Vec<EventTopic>,
    /// Only events involving one of these participants; empty means anyone.
    pub participants: Vec<ParticipantId>,
}

impl EventFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            participants: Vec::new(),
        }
    }

    /// Everything that concerns one participant.
    #[must_use]
    pub fn participant(id: ParticipantId) -> Self {
        Self {
            topics: Vec::new(),
            participants: vec![id],
        }
    }

    #[must_use]
    pub fn matches(&self, event: &RendezvousEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let participant_match =
            self.participants.is_empty() || self.participants.iter().any(|p| event.involves(p));

        topic_match && participant_match
    }
}
