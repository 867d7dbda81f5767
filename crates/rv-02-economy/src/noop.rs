//! Economy used when pricing is disabled.

use crate::economy::EconomySystem;
use crate::errors::Result;
use shared_types::ParticipantId;

/// Every operation succeeds; balances read as zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpEconomy;

impl EconomySystem for NoOpEconomy {
    fn get(&self, _who: &ParticipantId) -> Result<i64> {
        Ok(0)
    }

    fn set(&self, _who: &ParticipantId, _amount: i64) -> Result<()> {
        Ok(())
    }

    fn add(&self, _who: &ParticipantId, _amount: i64) -> Result<()> {
        Ok(())
    }

    fn reduce(&self, _who: &ParticipantId, _amount: i64) -> Result<()> {
        Ok(())
    }

    fn transfer(&self, _from: &ParticipantId, _to: &ParticipantId, _amount: i64) -> Result<()> {
        Ok(())
    }

    // Pricing is off, so nobody is ever short.
    fn has(&self, _who: &ParticipantId, _amount: i64) -> Result<bool> {
        Ok(true)
    }

    fn kind(&self) -> &'static str {
        "noop"
    }
}
