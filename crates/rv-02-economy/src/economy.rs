//! The economy port.

use crate::errors::Result;
use shared_types::ParticipantId;

/// Balance operations keyed by participant identity.
///
/// Implementations must be callable from any thread.
pub trait EconomySystem: Send + Sync {
    fn get(&self, who: &ParticipantId) -> Result<i64>;

    fn set(&self, who: &ParticipantId, amount: i64) -> Result<()>;

    fn add(&self, who: &ParticipantId, amount: i64) -> Result<()>;

    /// Debit `amount`; fails without side effects if the balance is short.
    fn reduce(&self, who: &ParticipantId, amount: i64) -> Result<()>;

    fn transfer(&self, from: &ParticipantId, to: &ParticipantId, amount: i64) -> Result<()>;

    fn has(&self, who: &ParticipantId, amount: i64) -> Result<bool> {
        Ok(self.get(who)? >= amount)
    }

    /// Short backend name for logs.
    fn kind(&self) -> &'static str;
}
