//! In-memory participant directory.
//!
//! Backs hosts and tests that have no world of their own: sessions are
//! added on join, dropped on leave, and teleporting rewrites the stored
//! location.

use crate::domain::{RendezvousError, Result};
use crate::ports::{ParticipantDirectory, ParticipantSession, Teleporter};
use parking_lot::RwLock;
use shared_types::{Location, ParticipantId};
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    sessions: RwLock<HashMap<ParticipantId, ParticipantSession>>,
}

impl InMemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an online session, replacing any previous one.
    pub fn join(&self, id: ParticipantId, name: impl Into<String>, location: Location) {
        let session = ParticipantSession {
            id,
            name: name.into(),
            location,
        };
        self.sessions.write().insert(id, session);
    }

    /// End a session. Returns `false` if it was not online.
    pub fn leave(&self, id: &ParticipantId) -> bool {
        self.sessions.write().remove(id).is_some()
    }

    #[must_use]
    pub fn location_of(&self, id: &ParticipantId) -> Option<Location> {
        self.sessions.read().get(id).map(|s| s.location)
    }

    #[must_use]
    pub fn online_count(&self) -> usize {
        self.sessions.read().len()
    }
}

impl ParticipantDirectory for InMemoryDirectory {
    fn lookup(&self, id: &ParticipantId) -> Option<ParticipantSession> {
        self.sessions.read().get(id).cloned()
    }

    fn is_online(&self, id: &ParticipantId) -> bool {
        self.sessions.read().contains_key(id)
    }
}

impl Teleporter for InMemoryDirectory {
    fn teleport(&self, who: &ParticipantId, destination: Location) -> Result<()> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(who)
            .ok_or(RendezvousError::ParticipantUnresolvable(*who))?;
        trace!(participant = %who, from = ?session.location, to = ?destination, "Teleport");
        session.location = destination;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Position;

    #[test]
    fn test_join_leave() {
        let directory = InMemoryDirectory::new();
        let id = ParticipantId::random();

        directory.join(id, "alice", Location::default());
        assert!(directory.is_online(&id));
        assert_eq!(directory.lookup(&id).unwrap().name, "alice");

        assert!(directory.leave(&id));
        assert!(!directory.leave(&id));
        assert!(directory.lookup(&id).is_none());
    }

    #[test]
    fn test_teleport_moves_online_participant() {
        let directory = InMemoryDirectory::new();
        let id = ParticipantId::random();
        directory.join(id, "bob", Location::default());

        let destination = Location {
            dimension: 1,
            position: Position {
                x: 10.0,
                y: 64.0,
                z: -3.5,
            },
        };
        directory.teleport(&id, destination).unwrap();
        assert_eq!(directory.location_of(&id), Some(destination));

        let ghost = ParticipantId::random();
        assert_eq!(
            directory.teleport(&ghost, destination),
            Err(RendezvousError::ParticipantUnresolvable(ghost))
        );
    }
}
