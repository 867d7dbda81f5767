//! Configuration loading for the node.

use anyhow::{Context, Result};
use rv_03_rendezvous::RendezvousConfig;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "RENDEZVOUS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "rendezvous.toml";

/// Path from `RENDEZVOUS_CONFIG`, or the default.
#[must_use]
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load `path`; a missing file means defaults, a broken one is an error.
pub fn load_config(path: &Path) -> Result<RendezvousConfig> {
    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using defaults");
        return Ok(RendezvousConfig::default());
    }

    let config = RendezvousConfig::load(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, RendezvousConfig::default());
    }

    #[test]
    fn test_broken_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "request_ttl_secs = 0").unwrap();
        assert!(load_config(file.path()).is_err());
    }
}
