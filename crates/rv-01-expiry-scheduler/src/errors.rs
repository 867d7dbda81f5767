//! Error types for the expiry scheduler.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchedulerError>;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// `start()` was called while the worker is alive.
    #[error("Scheduler worker already running")]
    AlreadyRunning,

    /// The OS refused to create the worker thread.
    #[error("Failed to spawn scheduler worker: {0}")]
    SpawnFailed(String),
}
