//! The request state machine.

use crate::ports::ParticipantDirectory;
use chrono::{DateTime, Local, Utc};
use rv_01_expiry_scheduler::{deadline_after, Expiring};
use shared_types::{Direction, ParticipantId, RequestId, RequestSnapshot, RequestState};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

/// Furthest ahead a wall-clock expiry is rendered.
const WALL_CLOCK_HORIZON: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Result of one transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// This call moved the request out of `Available`.
    Committed,
    /// The request was already in the requested terminal state.
    Unchanged,
    /// The request is terminal in a different state; nothing changed.
    Rejected,
}

impl Transition {
    #[must_use]
    pub fn is_committed(self) -> bool {
        self == Self::Committed
    }
}

/// A pending rendezvous between two participants.
///
/// Only stable ids are stored; presence is looked up in a
/// `ParticipantDirectory` at each use.
#[derive(Debug)]
pub struct Request {
    id: RequestId,
    initiator: ParticipantId,
    target: ParticipantId,
    direction: Direction,
    created_at: DateTime<Utc>,
    ttl: Duration,
    expires_at: Instant,
    state: AtomicU8,
}

impl Request {
    /// `now` is the monotonic instant the TTL counts from.
    #[must_use]
    pub fn new(
        initiator: ParticipantId,
        target: ParticipantId,
        direction: Direction,
        ttl: Duration,
        now: Instant,
    ) -> Self {
        Self {
            id: RequestId::new(),
            initiator,
            target,
            direction,
            created_at: Utc::now(),
            ttl,
            expires_at: deadline_after(now, ttl),
            state: AtomicU8::new(RequestState::Available as u8),
        }
    }

    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    #[must_use]
    pub fn initiator(&self) -> ParticipantId {
        self.initiator
    }

    #[must_use]
    pub fn target(&self) -> ParticipantId {
        self.target
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn state(&self) -> RequestState {
        // Only valid discriminants are ever stored.
        RequestState::from_u8(self.state.load(Ordering::Acquire)).unwrap_or(RequestState::Expired)
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.state() == RequestState::Available
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.is_available()
    }

    /// Move to `to` if the request is still `Available`.
    pub fn transition(&self, to: RequestState) -> Transition {
        if to == RequestState::Available {
            return if self.is_available() {
                Transition::Unchanged
            } else {
                Transition::Rejected
            };
        }

        match self.state.compare_exchange(
            RequestState::Available as u8,
            to as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => Transition::Committed,
            Err(current) if current == to as u8 => Transition::Unchanged,
            Err(_) => Transition::Rejected,
        }
    }

    /// `true` if the request is in state `to` after the call.
    pub fn try_transition(&self, to: RequestState) -> bool {
        self.transition(to) != Transition::Rejected
    }

    #[must_use]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Re-derive availability just before an explicit action.
    ///
    /// Checks initiator presence, then target presence, then expiry, and
    /// commits the first one that fails. Returns the state this call
    /// committed, if any.
    pub fn refresh(
        &self,
        directory: &dyn ParticipantDirectory,
        now: Instant,
    ) -> Option<RequestState> {
        if self.is_terminal() {
            return None;
        }

        let lapsed = if !self.is_initiator_online(directory) {
            RequestState::InitiatorOffline
        } else if !self.is_target_online(directory) {
            RequestState::TargetOffline
        } else if self.is_expired_at(now) {
            RequestState::Expired
        } else {
            return None;
        };
        self.transition(lapsed).is_committed().then_some(lapsed)
    }

    #[must_use]
    pub fn is_initiator_online(&self, directory: &dyn ParticipantDirectory) -> bool {
        directory.is_online(&self.initiator)
    }

    #[must_use]
    pub fn is_target_online(&self, directory: &dyn ParticipantDirectory) -> bool {
        directory.is_online(&self.target)
    }

    #[must_use]
    pub fn are_both_online(&self, directory: &dyn ParticipantDirectory) -> bool {
        self.is_initiator_online(directory) && self.is_target_online(directory)
    }

    /// The participant who moves on accept, and the one they move to.
    #[must_use]
    pub fn mover_and_anchor(&self) -> (ParticipantId, ParticipantId) {
        match self.direction {
            Direction::ToTarget => (self.initiator, self.target),
            Direction::ToInitiator => (self.target, self.initiator),
        }
    }

    /// The other party of the request, if `who` is one of them.
    #[must_use]
    pub fn counterpart(&self, who: &ParticipantId) -> Option<ParticipantId> {
        if who == &self.initiator {
            Some(self.target)
        } else if who == &self.target {
            Some(self.initiator)
        } else {
            None
        }
    }

    /// Time left before expiry, zero once lapsed.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }

    #[must_use]
    pub fn expires_at_wall(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.ttl.min(WALL_CLOCK_HORIZON))
            .ok()
            .and_then(|ttl| self.created_at.checked_add_signed(ttl))
            .unwrap_or(self.created_at)
    }

    /// Local wall-clock expiry as `YYYY-MM-DD HH:MM:SS`.
    #[must_use]
    pub fn expiration_display(&self) -> String {
        self.expires_at_wall()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    #[must_use]
    pub fn snapshot(&self) -> RequestSnapshot {
        RequestSnapshot {
            id: self.id,
            initiator: self.initiator,
            target: self.target,
            direction: self.direction,
            state: self.state(),
            created_at: self.created_at,
            expires_at_wall: self.expires_at_wall(),
        }
    }
}

impl Expiring for Request {
    fn expires_at(&self) -> Instant {
        self.expires_at
    }
}
