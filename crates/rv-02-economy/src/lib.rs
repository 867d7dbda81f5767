//! # Economy Capability
//!
//! Balance operations keyed by participant identity, behind one trait so
//! the rendezvous core never knows which backend it is charging.
//!
//! | Variant | Backing | Notes |
//! |---------|---------|-------|
//! | `NoOpEconomy` | nothing | pricing disabled; balance reads as zero |
//! | `LedgerEconomy` | a scored objective in a `ScoreLedger` | transfer is reduce, add, compensate |
//! | `LegacyBridgeEconomy` | an external `BalanceProvider` | resolved on every call, fails if absent |

pub mod config;
pub mod economy;
pub mod errors;
pub mod ledger;
pub mod legacy;
pub mod noop;

pub use config::{build_economy, EconomyBackends, EconomyConfig, EconomyKind};
pub use economy::EconomySystem;
pub use errors::{EconomyError, Result};
pub use ledger::{InMemoryScoreLedger, LedgerEconomy, ScoreLedger, ScoreOp};
pub use legacy::{BalanceProvider, LegacyBridgeEconomy, ProviderResolver, ProviderSlot};
pub use noop::NoOpEconomy;
