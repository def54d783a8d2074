//! Application configuration loaded from TOML.
//!
//! Lookup order for the config file: `FOLIO_CONFIG`, then
//! `~/.folio/config.toml`. A missing file yields the defaults.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FolioConfig {
    pub benchmark: BenchmarkConfig,
    pub storage: StorageConfig,
    pub provider: ProviderConfig,
}

/// Benchmark the portfolio is measured against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Index or asset ticker
    pub ticker: String,
    /// Annual risk-free rate as a decimal fraction
    pub risk_free_rate: f64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            ticker: "^GSPC".to_string(),
            risk_free_rate: 0.02,
        }
    }
}

/// Where data lives on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Portfolio JSON file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio_file: Option<PathBuf>,
    /// Directory of `<TICKER>.json` bar files for the `files` source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_dir: Option<PathBuf>,
}

/// Which price source to use.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    #[default]
    Yahoo,
    Files,
}

/// Price provider tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub source: PriceSource,
    pub history_cache_ttl_secs: u64,
    /// Total attempts for a rate-limited request
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            source: PriceSource::Yahoo,
            history_cache_ttl_secs: 900,
            max_attempts: 3,
            retry_delay_ms: 300,
            timeout_secs: 20,
        }
    }
}

impl ProviderConfig {
    pub fn history_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.history_cache_ttl_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl FolioConfig {
    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from a specific file; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Get the default config file path.
    ///
    /// Can be overridden with the `FOLIO_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("FOLIO_CONFIG") {
            return PathBuf::from(path);
        }
        folio_home().join("config.toml")
    }

    /// Resolve the portfolio file.
    ///
    /// `FOLIO_PORTFOLIO_FILE` wins over the config entry, which wins over
    /// `~/.folio/portfolio.json`.
    pub fn portfolio_path(&self) -> PathBuf {
        if let Ok(path) = env::var("FOLIO_PORTFOLIO_FILE") {
            return PathBuf::from(path);
        }
        self.storage
            .portfolio_file
            .clone()
            .unwrap_or_else(|| folio_home().join("portfolio.json"))
    }

    /// Resolve the bar-file directory, defaulting to `~/.folio/prices`.
    pub fn price_dir(&self) -> PathBuf {
        self.storage
            .price_dir
            .clone()
            .unwrap_or_else(|| folio_home().join("prices"))
    }
}

fn folio_home() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".folio"))
        .unwrap_or_else(|| PathBuf::from(".folio"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = FolioConfig::load_from_path(&dir.path().join("nope.toml")).unwrap();

        assert_eq!(config, FolioConfig::default());
        assert_eq!(config.benchmark.ticker, "^GSPC");
        assert_eq!(config.benchmark.risk_free_rate, 0.02);
        assert_eq!(config.provider.max_attempts, 3);
        assert_eq!(config.provider.history_cache_ttl(), Duration::from_secs(900));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[benchmark]
ticker = "^FCHI"

[provider]
source = "files"
retry_delay_ms = 50

[storage]
price_dir = "/data/prices"
"#,
        )
        .unwrap();

        let config = FolioConfig::load_from_path(&path).unwrap();
        assert_eq!(config.benchmark.ticker, "^FCHI");
        assert_eq!(config.benchmark.risk_free_rate, 0.02);
        assert_eq!(config.provider.source, PriceSource::Files);
        assert_eq!(config.provider.retry_delay(), Duration::from_millis(50));
        assert_eq!(config.provider.timeout_secs, 20);
        assert_eq!(config.price_dir(), PathBuf::from("/data/prices"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[benchmark\nticker = 1").unwrap();

        assert!(matches!(
            FolioConfig::load_from_path(&path),
            Err(crate::Error::Toml(_))
        ));
    }
}
