//! Ledger-objective economy.
//!
//! Balances live as scores under a named objective of a `ScoreLedger`.
//! There is no transaction across participants: `transfer` debits the
//! source, credits the target, and credits the source back if the second
//! step fails. Other writers of the same ledger can interleave between
//! those steps.

use crate::economy::EconomySystem;
use crate::errors::{EconomyError, Result};
use parking_lot::RwLock;
use shared_types::ParticipantId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Mutation applied to one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOp {
    Set(i64),
    Add(i64),
    /// Subtract, or fail with `InsufficientBalance` leaving the score as is.
    Withdraw(i64),
}

/// Persistent scored counters, grouped by objective.
pub trait ScoreLedger: Send + Sync {
    /// Current score; `None` if the objective does not exist.
    /// A participant without an entry scores zero.
    fn score(&self, objective: &str, who: &ParticipantId) -> Option<i64>;

    /// Apply `op` atomically and return the new score.
    fn modify(&self, objective: &str, who: &ParticipantId, op: ScoreOp) -> Result<i64>;
}

/// Ledger kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryScoreLedger {
    objectives: RwLock<HashMap<String, HashMap<ParticipantId, i64>>>,
}

impl InMemoryScoreLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_objective(objective: &str) -> Self {
        let ledger = Self::new();
        ledger.create_objective(objective);
        ledger
    }

    /// Create an objective; existing scores are kept.
    pub fn create_objective(&self, objective: &str) {
        self.objectives
            .write()
            .entry(objective.to_string())
            .or_default();
    }
}

impl ScoreLedger for InMemoryScoreLedger {
    fn score(&self, objective: &str, who: &ParticipantId) -> Option<i64> {
        self.objectives
            .read()
            .get(objective)
            .map(|scores| scores.get(who).copied().unwrap_or(0))
    }

    fn modify(&self, objective: &str, who: &ParticipantId, op: ScoreOp) -> Result<i64> {
        let mut objectives = self.objectives.write();
        let scores = objectives
            .get_mut(objective)
            .ok_or_else(|| EconomyError::ObjectiveMissing(objective.to_string()))?;
        let current = scores.get(who).copied().unwrap_or(0);
        let next = match op {
            ScoreOp::Set(v) => v,
            ScoreOp::Add(v) => current.saturating_add(v),
            ScoreOp::Withdraw(v) if current < v => {
                return Err(EconomyError::InsufficientBalance {
                    required: v,
                    available: current,
                });
            }
            ScoreOp::Withdraw(v) => current - v,
        };
        scores.insert(*who, next);
        Ok(next)
    }
}

/// Economy backed by one objective of a `ScoreLedger`.
pub struct LedgerEconomy {
    ledger: Arc<dyn ScoreLedger>,
    objective: String,
}

impl LedgerEconomy {
    pub fn new(ledger: Arc<dyn ScoreLedger>, objective: impl Into<String>) -> Self {
        Self {
            ledger,
            objective: objective.into(),
        }
    }

    #[must_use]
    pub fn objective(&self) -> &str {
        &self.objective
    }

    fn missing(&self) -> EconomyError {
        EconomyError::ObjectiveMissing(self.objective.clone())
    }
}

impl EconomySystem for LedgerEconomy {
    fn get(&self, who: &ParticipantId) -> Result<i64> {
        self.ledger
            .score(&self.objective, who)
            .ok_or_else(|| self.missing())
    }

    fn set(&self, who: &ParticipantId, amount: i64) -> Result<()> {
        self.ledger
            .modify(&self.objective, who, ScoreOp::Set(amount))
            .map(|_| ())
    }

    fn add(&self, who: &ParticipantId, amount: i64) -> Result<()> {
        if amount < 0 {
            return Err(EconomyError::NegativeAmount(amount));
        }
        self.ledger
            .modify(&self.objective, who, ScoreOp::Add(amount))
            .map(|_| ())
    }

    fn reduce(&self, who: &ParticipantId, amount: i64) -> Result<()> {
        if amount < 0 {
            return Err(EconomyError::NegativeAmount(amount));
        }
        let balance = self
            .ledger
            .modify(&self.objective, who, ScoreOp::Withdraw(amount))?;
        debug!(participant = %who, amount, balance, "Ledger debit");
        Ok(())
    }

    fn transfer(&self, from: &ParticipantId, to: &ParticipantId, amount: i64) -> Result<()> {
        self.reduce(from, amount)?;
        if let Err(e) = self.add(to, amount) {
            if let Err(rollback) = self.add(from, amount) {
                error!(
                    from = %from,
                    amount,
                    error = %rollback,
                    "Transfer compensation failed; debit left in place"
                );
            }
            return Err(e);
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "ledger"
    }
}
