//! # Expiry Scheduler
//!
//! Holds items that know their own expiry instant and hands each of them to
//! a callback exactly once, at or after that instant.
//!
//! ```text
//!   add(item) ──→ [ min-heap by expiry ] ──worker──→ on_expire(item)
//!                        ↑      │
//!            notify if earlier  └─ wait until next expiry / poll interval
//! ```
//!
//! ## Guarantees
//!
//! | Property | Enforcement |
//! |----------|-------------|
//! | Fires at or after expiry | worker compares against `Clock::now()` |
//! | Fires exactly once | items are popped from the heap before the callback |
//! | Non-decreasing order within a batch | heap order, ties by insertion sequence |
//! | Callbacks may re-enter `add` | callbacks run with the queue lock released |
//! | A failing callback never stops the worker | errors and panics are logged |

pub mod clock;
pub mod errors;
pub mod scheduler;

pub use clock::{deadline_after, Clock, ManualClock, MonotonicClock};
pub use errors::{Result, SchedulerError};
pub use scheduler::{ExpiryCallback, ExpiryScheduler, Expiring, DEFAULT_POLL_INTERVAL};
