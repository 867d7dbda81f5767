//! Rendezvous configuration.
//!
//! ```toml
//! request_ttl_secs = 120
//! cooldown_secs = 10
//! disallowed_dimensions = [1]
//! create_request_price = "0"
//! scheduler_poll_interval_ms = 1000
//!
//! [economy]
//! enabled = true
//! kind = "ledger"
//! objective = "money"
//! currency_name = "coin"
//! ```
//!
//! Missing keys fall back to their defaults.

use rv_02_economy::{EconomyConfig, EconomyKind};
use serde::{Deserialize, Serialize};
use shared_types::DimensionId;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on `request_ttl_secs` and `cooldown_secs` (one week).
pub const MAX_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendezvousConfig {
    /// Lifetime of a request from creation.
    pub request_ttl_secs: u64,
    /// How long an initiator waits between two creations.
    pub cooldown_secs: u64,
    /// Dimensions the initiator may not create requests from.
    pub disallowed_dimensions: Vec<DimensionId>,
    /// Price expression evaluated on every creation.
    pub create_request_price: String,
    /// Upper bound on how long the expiry worker sleeps with nothing due.
    pub scheduler_poll_interval_ms: u64,
    pub economy: EconomyConfig,
}

impl Default for RendezvousConfig {
    fn default() -> Self {
        Self {
            request_ttl_secs: 120,
            cooldown_secs: 10,
            disallowed_dimensions: Vec::new(),
            create_request_price: "0".to_string(),
            scheduler_poll_interval_ms: 1000,
            economy: EconomyConfig::default(),
        }
    }
}

impl RendezvousConfig {
    /// Read and validate a TOML file.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, `Parse` or `Invalid` otherwise.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_ttl_secs must be greater than zero".into(),
            ));
        }
        if self.request_ttl_secs > MAX_DURATION_SECS {
            return Err(ConfigError::Invalid(format!(
                "request_ttl_secs must be at most {MAX_DURATION_SECS}"
            )));
        }
        if self.cooldown_secs > MAX_DURATION_SECS {
            return Err(ConfigError::Invalid(format!(
                "cooldown_secs must be at most {MAX_DURATION_SECS}"
            )));
        }
        if self.scheduler_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "scheduler_poll_interval_ms must be greater than zero".into(),
            ));
        }
        if self.economy.enabled
            && self.economy.kind == EconomyKind::Ledger
            && self.economy.objective.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "economy.objective must be set for the ledger economy".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn request_ttl(&self) -> Duration {
        Duration::from_secs(self.request_ttl_secs)
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.scheduler_poll_interval_ms)
    }

    #[must_use]
    pub fn is_dimension_disallowed(&self, dimension: DimensionId) -> bool {
        self.disallowed_dimensions.contains(&dimension)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
