//! # Shared Bus - Lifecycle Notifications for Rendezvous Requests
//!
//! Every state change a request goes through is published here so that
//! presentation and messaging collaborators can react without the core
//! knowing about them.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Rendezvous   │    publish()       │ Presentation │
//! │ core         │ ──────┐            │ / messaging  │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Delivery is best effort: a subscriber that lags behind the channel
//! capacity loses the oldest notifications, and publishing with no
//! subscribers drops the event.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, RendezvousEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::Subscription;

/// Maximum events to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

