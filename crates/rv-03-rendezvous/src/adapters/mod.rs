//! Adapters layer.
//!
//! Event bus integration and an in-memory participant directory.

pub mod directory;
pub mod publisher;

pub use directory::InMemoryDirectory;
pub use publisher::NotificationPublisher;
