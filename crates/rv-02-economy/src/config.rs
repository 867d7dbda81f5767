//! Economy configuration and backend selection.

use crate::economy::EconomySystem;
use crate::errors::{EconomyError, Result};
use crate::ledger::{LedgerEconomy, ScoreLedger};
use crate::legacy::{LegacyBridgeEconomy, ProviderResolver};
use crate::noop::NoOpEconomy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const LEGACY_PROVIDER_NAME: &str = "LegacyMoney";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EconomyKind {
    /// Balances are scores under `objective`.
    #[default]
    Ledger,
    /// Balances come from the external provider.
    LegacyBridge,
}

impl EconomyKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ledger => "ledger",
            Self::LegacyBridge => "legacy_bridge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub enabled: bool,
    pub kind: EconomyKind,
    /// Ledger objective holding balances.
    pub objective: String,
    /// Display name of the currency.
    pub currency_name: String,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: EconomyKind::Ledger,
            objective: "money".to_string(),
            currency_name: "coin".to_string(),
        }
    }
}

/// Backends the host makes available for `build_economy`.
#[derive(Default, Clone)]
pub struct EconomyBackends {
    pub ledger: Option<Arc<dyn ScoreLedger>>,
    pub legacy: Option<Arc<dyn ProviderResolver>>,
}

/// Pick the economy variant described by `config`.
///
/// A disabled economy is always `NoOpEconomy`, whatever backends exist.
pub fn build_economy(
    config: &EconomyConfig,
    backends: &EconomyBackends,
) -> Result<Arc<dyn EconomySystem>> {
    if !config.enabled {
        debug!("Economy disabled; using no-op backend");
        return Ok(Arc::new(NoOpEconomy));
    }

    let economy: Arc<dyn EconomySystem> = match config.kind {
        EconomyKind::Ledger => {
            let ledger = backends
                .ledger
                .clone()
                .ok_or(EconomyError::BackendMissing(config.kind.as_str()))?;
            Arc::new(LedgerEconomy::new(ledger, config.objective.clone()))
        }
        EconomyKind::LegacyBridge => {
            let resolver = backends
                .legacy
                .clone()
                .ok_or(EconomyError::BackendMissing(config.kind.as_str()))?;
            Arc::new(LegacyBridgeEconomy::new(resolver, LEGACY_PROVIDER_NAME))
        }
    };

    debug!(kind = economy.kind(), objective = %config.objective, "Economy backend selected");
    Ok(economy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryScoreLedger;
    use crate::legacy::ProviderSlot;

    #[test]
    fn test_parse_from_toml() {
        let config: EconomyConfig = toml::from_str(
            r#"
            enabled = true
            kind = "legacy_bridge"
            currency_name = "gold"
            "#,
        )
        .unwrap();

        assert!(config.enabled);
        assert_eq!(config.kind, EconomyKind::LegacyBridge);
        assert_eq!(config.objective, "money");
        assert_eq!(config.currency_name, "gold");
    }

    #[test]
    fn test_disabled_is_noop() {
        let economy = build_economy(&EconomyConfig::default(), &EconomyBackends::default()).unwrap();
        assert_eq!(economy.kind(), "noop");
    }

    #[test]
    fn test_selects_configured_backend() {
        let backends = EconomyBackends {
            ledger: Some(Arc::new(InMemoryScoreLedger::with_objective("money"))),
            legacy: Some(Arc::new(ProviderSlot::new())),
        };
        let mut config = EconomyConfig {
            enabled: true,
            ..EconomyConfig::default()
        };
        assert_eq!(build_economy(&config, &backends).unwrap().kind(), "ledger");

        config.kind = EconomyKind::LegacyBridge;
        assert_eq!(
            build_economy(&config, &backends).unwrap().kind(),
            "legacy-bridge"
        );
    }

    #[test]
    fn test_missing_backend() {
        let config = EconomyConfig {
            enabled: true,
            ..EconomyConfig::default()
        };
        assert_eq!(
            build_economy(&config, &EconomyBackends::default()).err(),
            Some(EconomyError::BackendMissing("ledger"))
        );
    }
}
