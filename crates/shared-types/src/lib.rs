//! # Shared Types Crate
//!
//! Identity, location and request snapshot types shared by the scheduler,
//! the economy capability, the event bus and the rendezvous core.
//!
//! ## Design Principles
//!
//! - **Identifiers, not handles**: participants are referenced by a stable
//!   `ParticipantId`; live sessions are looked up on demand and may be gone.
//! - **Snapshots cross boundaries**: the live request entity never leaves the
//!   core crate; notifications carry an immutable `RequestSnapshot`.

pub mod entities;

pub use entities::*;
