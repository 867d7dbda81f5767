//! # Scheduler
//!
//! A binary heap of `Scheduled<T>` guarded by one mutex, plus a condvar the
//! worker parks on. `add` only notifies when the new item would be due
//! before the instant the worker is currently waiting for.

use crate::clock::{Clock, MonotonicClock};
use crate::errors::{Result, SchedulerError};
use parking_lot::{Condvar, Mutex, MutexGuard, RwLock};
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Longest the worker sleeps before re-checking the stop flag.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Anything that knows the monotonic instant it stops being valid.
pub trait Expiring: Send + Sync + 'static {
    fn expires_at(&self) -> Instant;
}

/// Invoked once per item when it falls due.
pub type ExpiryCallback<T> = Arc<dyn Fn(Arc<T>) -> anyhow::Result<()> + Send + Sync>;

struct Scheduled<T> {
    expires_at: Instant,
    seq: u64,
    item: Arc<T>,
}

// BinaryHeap is a max-heap; invert so the earliest expiry sits on top.
impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .expires_at
            .cmp(&self.expires_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl<T> Eq for Scheduled<T> {}

struct QueueState<T> {
    heap: BinaryHeap<Scheduled<T>>,
    next_seq: u64,
    /// Instant the worker is parked until; `None` while idle on an empty heap.
    wait_target: Option<Instant>,
}

struct Shared<T> {
    queue: Mutex<QueueState<T>>,
    wakeup: Condvar,
    abort: AtomicBool,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    on_expire: RwLock<Option<ExpiryCallback<T>>>,
    fired: AtomicU64,
    failed: AtomicU64,
}

impl<T: Expiring> Shared<T> {
    fn run(&self) {
        debug!("Expiry worker started");
        let mut queue = self.queue.lock();

        while !self.abort.load(Ordering::Acquire) {
            if queue.heap.is_empty() {
                queue.wait_target = None;
                self.wakeup.wait_for(&mut queue, self.poll_interval);
                continue;
            }

            let now = self.clock.now();
            let due = Self::drain_due(&mut queue, now);
            if !due.is_empty() {
                MutexGuard::unlocked(&mut queue, || {
                    for item in due {
                        self.fire(item);
                    }
                });
                continue;
            }

            let Some(next) = queue.heap.peek().map(|s| s.expires_at) else {
                continue;
            };
            queue.wait_target = Some(next);
            let wait = next.saturating_duration_since(now).min(self.poll_interval);
            self.wakeup.wait_for(&mut queue, wait);
        }

        debug!(pending = queue.heap.len(), "Expiry worker exiting");
    }

    fn drain_due(queue: &mut QueueState<T>, now: Instant) -> Vec<Arc<T>> {
        let mut due = Vec::new();
        while queue.heap.peek().is_some_and(|s| s.expires_at <= now) {
            if let Some(scheduled) = queue.heap.pop() {
                due.push(scheduled.item);
            }
        }
        due
    }

    fn fire(&self, item: Arc<T>) {
        let Some(callback) = self.on_expire.read().clone() else {
            return;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| callback(item))) {
            Ok(Ok(())) => {
                self.fired.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "Expiry callback failed");
            }
            Err(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                error!("Expiry callback panicked");
            }
        }
    }
}

/// Least-expiry-first scheduler with one background worker thread.
pub struct ExpiryScheduler<T: Expiring> {
    shared: Arc<Shared<T>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Expiring> ExpiryScheduler<T> {
    /// Scheduler on the process' monotonic clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock), DEFAULT_POLL_INTERVAL)
    }

    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>, poll_interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(QueueState {
                    heap: BinaryHeap::new(),
                    next_seq: 0,
                    wait_target: None,
                }),
                wakeup: Condvar::new(),
                abort: AtomicBool::new(false),
                clock,
                poll_interval,
                on_expire: RwLock::new(None),
                fired: AtomicU64::new(0),
                failed: AtomicU64::new(0),
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn set_expire_callback(&self, callback: ExpiryCallback<T>) {
        *self.shared.on_expire.write() = Some(callback);
    }

    /// The clock expiry decisions are made against.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        self.shared.clock.clone()
    }

    /// Queue an item; wakes the worker if it is now the earliest.
    pub fn add(&self, item: Arc<T>) {
        let expires_at = item.expires_at();
        let wake = {
            let mut queue = self.shared.queue.lock();
            let seq = queue.next_seq;
            queue.next_seq += 1;
            queue.heap.push(Scheduled {
                expires_at,
                seq,
                item,
            });
            queue.wait_target.map_or(true, |target| expires_at < target)
        };

        if wake {
            self.shared.wakeup.notify_one();
        }
    }

    /// Spawn the worker thread.
    pub fn start(&self) -> Result<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.shared.abort.store(false, Ordering::Release);
        let shared = self.shared.clone();
        let handle = thread::Builder::new()
            .name("rendezvous-expiry".into())
            .spawn(move || shared.run())
            .map_err(|e| SchedulerError::SpawnFailed(e.to_string()))?;

        *worker = Some(handle);
        info!(poll_interval = ?self.shared.poll_interval, "Expiry scheduler started");
        Ok(())
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// Idempotent. Called from inside an expiry callback it only signals,
    /// since the worker cannot join itself.
    pub fn stop(&self) {
        self.shared.abort.store(true, Ordering::Release);
        {
            // Taking the lock orders the flag store before the worker's next wait.
            let _queue = self.shared.queue.lock();
            self.shared.wakeup.notify_all();
        }

        let Some(handle) = self.worker.lock().take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            warn!("Expiry scheduler stopped from its own worker; not joining");
            return;
        }
        if handle.join().is_err() {
            error!("Expiry worker terminated by panic");
        }
        info!("Expiry scheduler stopped");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Items still waiting to fire.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.queue.lock().heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Callbacks that returned `Ok`.
    #[must_use]
    pub fn fired_count(&self) -> u64 {
        self.shared.fired.load(Ordering::Relaxed)
    }

    /// Callbacks that returned an error or panicked.
    #[must_use]
    pub fn failed_count(&self) -> u64 {
        self.shared.failed.load(Ordering::Relaxed)
    }
}

impl<T: Expiring> Default for ExpiryScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Expiring> Drop for ExpiryScheduler<T> {
    fn drop(&mut self) {
        self.stop();
    }
}
