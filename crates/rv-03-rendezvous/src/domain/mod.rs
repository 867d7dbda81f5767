//! # Domain Layer
//!
//! - `entities`: the `Request` state machine
//! - `registry`: dual-indexed concurrent request store
//! - `cooldown`: per-participant creation cooldown
//! - `errors`: `RendezvousError`

pub mod cooldown;
pub mod entities;
pub mod errors;
pub mod registry;

pub use cooldown::*;
pub use entities::*;
pub use errors::*;
pub use registry::*;
