//! Event handlers running on the node's runtime.

pub mod notifications;

pub use notifications::NotificationLogger;
