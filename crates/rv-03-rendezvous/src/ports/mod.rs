//! Ports layer.
//!
//! - Inbound (driving): the API exposed to command and UI layers
//! - Outbound (driven): collaborators the core calls into

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
