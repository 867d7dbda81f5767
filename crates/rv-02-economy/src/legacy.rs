//! Bridge to an externally loaded balance provider.
//!
//! The provider is looked up on every call, so it may be loaded or unloaded
//! while the process runs. When it is absent every operation fails with
//! `ProviderUnavailable`.

use crate::economy::EconomySystem;
use crate::errors::{EconomyError, Result};
use parking_lot::RwLock;
use shared_types::ParticipantId;
use std::sync::Arc;

const TRANSFER_NOTE: &str = "rendezvous transfer";

/// Balance API exposed by the external provider.
///
/// Mirrors the provider's boolean contract: `false` means "refused".
pub trait BalanceProvider: Send + Sync {
    fn name(&self) -> &str;
    fn get(&self, who: &ParticipantId) -> i64;
    fn set(&self, who: &ParticipantId, amount: i64) -> bool;
    fn add(&self, who: &ParticipantId, amount: i64) -> bool;
    fn reduce(&self, who: &ParticipantId, amount: i64) -> bool;
    fn transfer(&self, from: &ParticipantId, to: &ParticipantId, amount: i64, note: &str) -> bool;
}

/// Finds the provider at call time.
pub trait ProviderResolver: Send + Sync {
    fn resolve(&self) -> Option<Arc<dyn BalanceProvider>>;
}

/// A resolver whose provider can be installed and removed at runtime.
#[derive(Default)]
pub struct ProviderSlot {
    provider: RwLock<Option<Arc<dyn BalanceProvider>>>,
}

impl ProviderSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, provider: Arc<dyn BalanceProvider>) {
        *self.provider.write() = Some(provider);
    }

    pub fn unload(&self) {
        *self.provider.write() = None;
    }
}

impl ProviderResolver for ProviderSlot {
    fn resolve(&self) -> Option<Arc<dyn BalanceProvider>> {
        self.provider.read().clone()
    }
}

pub struct LegacyBridgeEconomy {
    resolver: Arc<dyn ProviderResolver>,
    provider_name: String,
}

impl LegacyBridgeEconomy {
    /// `provider_name` is only used in the error when resolution fails.
    pub fn new(resolver: Arc<dyn ProviderResolver>, provider_name: impl Into<String>) -> Self {
        Self {
            resolver,
            provider_name: provider_name.into(),
        }
    }

    fn provider(&self) -> Result<Arc<dyn BalanceProvider>> {
        self.resolver
            .resolve()
            .ok_or_else(|| EconomyError::ProviderUnavailable(self.provider_name.clone()))
    }

    fn check(accepted: bool, operation: &'static str, participant: &ParticipantId) -> Result<()> {
        if accepted {
            Ok(())
        } else {
            Err(EconomyError::Rejected {
                operation,
                participant: *participant,
            })
        }
    }
}

impl EconomySystem for LegacyBridgeEconomy {
    fn get(&self, who: &ParticipantId) -> Result<i64> {
        Ok(self.provider()?.get(who))
    }

    fn set(&self, who: &ParticipantId, amount: i64) -> Result<()> {
        Self::check(self.provider()?.set(who, amount), "set", who)
    }

    fn add(&self, who: &ParticipantId, amount: i64) -> Result<()> {
        Self::check(self.provider()?.add(who, amount), "add", who)
    }

    fn reduce(&self, who: &ParticipantId, amount: i64) -> Result<()> {
        let provider = self.provider()?;
        let available = provider.get(who);
        if available < amount {
            return Err(EconomyError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        Self::check(provider.reduce(who, amount), "reduce", who)
    }

    fn transfer(&self, from: &ParticipantId, to: &ParticipantId, amount: i64) -> Result<()> {
        Self::check(
            self.provider()?.transfer(from, to, amount, TRANSFER_NOTE),
            "transfer",
            from,
        )
    }

    fn kind(&self) -> &'static str {
        "legacy-bridge"
    }
}
