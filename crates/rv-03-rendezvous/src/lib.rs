//! # Rendezvous Requests
//!
//! One online participant asks another for a rendezvous, either "bring me
//! to you" (`Direction::ToTarget`) or "bring you to me"
//! (`Direction::ToInitiator`). Requests are cooled down, priced, and
//! resolved exactly once: by the target (accept/deny), by the initiator
//! (cancel), by timeout, or by either party disconnecting.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | State leaves `Available` at most once | `Request::transition` (compare-and-swap on an `AtomicU8`) |
//! | Forward and reverse index always agree | `RequestRegistry` (one `RwLock` over both maps) |
//! | One request per ordered pair | `RequestRegistry::insert` replaces the previous entry |
//! | Stale signals never remove a replacement | `RequestRegistry::remove_request` compares `RequestId` |
//! | Expiry fixed at creation | `Request::new` captures the TTL in effect |
//!
//! ## Request lifecycle
//!
//! ```text
//!              ┌── accept ──→ [Accepted]
//!              ├── deny ────→ [Denied]
//! [Available] ─┼── cancel ──→ [Cancelled]
//!              ├── ttl ─────→ [Expired]
//!              └── offline ─→ [InitiatorOffline] / [TargetOffline]
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/   - notification publisher, in-memory directory     │
//! │  controller  - scheduler callback + bus signals → registry     │
//! │  service     - creation pathway, resolution, queries           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ports/inbound.rs  - RendezvousApi                              │
//! │  ports/outbound.rs - ParticipantDirectory, Teleporter,          │
//! │                      Presenter, PriceEvaluator, RequestGuard    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  domain/entities.rs - Request state machine                     │
//! │  domain/registry.rs - dual-indexed RequestRegistry              │
//! │  domain/cooldown.rs - per-participant cooldown table            │
//! │  domain/errors.rs   - RendezvousError                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod config;
pub mod controller;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryDirectory, NotificationPublisher};
pub use config::{ConfigError, RendezvousConfig};
pub use controller::RegistryController;
pub use domain::*;
pub use ports::*;
pub use service::{RendezvousPorts, RendezvousService};
