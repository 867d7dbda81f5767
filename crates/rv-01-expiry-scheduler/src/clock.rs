//! Monotonic clock sources.
//!
//! Expiry decisions only ever compare `Instant`s from a `Clock`; wall-clock
//! time is reserved for display.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time provider.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The process' monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Starts at the real instant it was created and advances in whole
/// milliseconds.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset_ms: AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        deadline_after(
            self.origin,
            Duration::from_millis(self.offset_ms.load(Ordering::SeqCst)),
        )
    }
}

/// `now + after`, shortened to the latest representable instant instead of
/// overflowing.
#[must_use]
pub fn deadline_after(now: Instant, after: Duration) -> Instant {
    let mut span = after;
    loop {
        if let Some(deadline) = now.checked_add(span) {
            return deadline;
        }
        span /= 2;
    }
}
