//! Per-participant creation cooldown.

use parking_lot::Mutex;
use rv_01_expiry_scheduler::deadline_after;
use shared_types::ParticipantId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Table size below which lapsed entries are never swept.
const PRUNE_FLOOR: usize = 64;

#[derive(Debug)]
struct Table {
    until: HashMap<ParticipantId, Instant>,
    /// Size at which the next sweep of lapsed entries runs.
    prune_at: usize,
}

impl Table {
    fn left(&self, who: &ParticipantId, now: Instant) -> Option<Duration> {
        self.until
            .get(who)
            .and_then(|until| until.checked_duration_since(now))
            .filter(|left| !left.is_zero())
    }

    fn prune(&mut self, now: Instant) {
        self.until.retain(|_, u| *u > now);
        self.prune_at = (self.until.len() * 2).max(PRUNE_FLOOR);
    }
}

/// Tracks until when each participant is barred from creating requests.
#[derive(Debug)]
pub struct Cooldown {
    table: Mutex<Table>,
}

impl Default for Cooldown {
    fn default() -> Self {
        Self {
            table: Mutex::new(Table {
                until: HashMap::new(),
                prune_at: PRUNE_FLOOR,
            }),
        }
    }
}

impl Cooldown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Time left on `who`'s cooldown, `None` if it is over.
    #[must_use]
    pub fn remaining(&self, who: &ParticipantId, now: Instant) -> Option<Duration> {
        self.table.lock().left(who, now)
    }

    /// Start a cooldown for `who` unless one is already running.
    ///
    /// Check and set happen under one lock, so two concurrent creations by
    /// the same participant cannot both pass. Returns the time left when
    /// the cooldown is still active.
    pub fn try_begin(
        &self,
        who: &ParticipantId,
        duration: Duration,
        now: Instant,
    ) -> Result<(), Duration> {
        let mut table = self.table.lock();
        if let Some(left) = table.left(who, now) {
            return Err(left);
        }

        // Any entry left for `who` has lapsed.
        if duration.is_zero() {
            table.until.remove(who);
        } else {
            table.until.insert(*who, deadline_after(now, duration));
        }
        if table.until.len() >= table.prune_at {
            table.prune(now);
        }
        Ok(())
    }

    pub fn clear(&self, who: &ParticipantId) {
        self.table.lock().until.remove(who);
    }

    /// Entries held, including lapsed ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.lock().until.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
