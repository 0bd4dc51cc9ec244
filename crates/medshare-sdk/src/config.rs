//! Share configuration
//!
//! Loaded from TOML. Every section has defaults, so an empty file is a
//! valid configuration pointing at local services.

use crate::address::Address;
use crate::error::{Result, ShareError};
use medshare_client::{GuidanceConfig, PinMode, ServiceConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Connected identity; shares and views need one
    #[serde(default)]
    pub participant: Option<String>,

    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Event-index service
    #[serde(default = "default_backend")]
    pub index: ServiceConfig,

    /// Contract relay
    #[serde(default = "default_backend")]
    pub contract: ServiceConfig,

    /// Patient-records service
    #[serde(default = "default_records")]
    pub records: ServiceConfig,

    #[serde(default)]
    pub guidance: GuidanceConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Public gateway used to build view/download links
    #[serde(default = "default_ipfs_gateway")]
    pub ipfs_gateway: String,
}

/// Pinning gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(flatten)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub mode: PinMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Lives for the process only
    Memory,
    /// SQLite file at `cache.path`
    #[default]
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Polling interval for view refresh
    #[serde(default = "default_refresh_interval")]
    pub interval_secs: u64,

    /// Days covered by the activity summary
    #[serde(default = "default_activity_days")]
    pub activity_days: u32,
}

// Defaults
fn default_backend() -> ServiceConfig { ServiceConfig::new("http://localhost:5001") }
fn default_records() -> ServiceConfig { ServiceConfig::new("http://localhost:3000") }
fn default_ipfs_gateway() -> String { "https://ipfs.io".to_string() }
fn default_cache_path() -> PathBuf { PathBuf::from(".medshare/cache.db") }
fn default_refresh_interval() -> u64 { 10 }
fn default_activity_days() -> u32 { crate::sync::DEFAULT_ACTIVITY_DAYS }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            service: default_backend(),
            mode: PinMode::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            path: default_cache_path(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_refresh_interval(),
            activity_days: default_activity_days(),
        }
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            participant: None,
            gateway: GatewayConfig::default(),
            index: default_backend(),
            contract: default_backend(),
            records: default_records(),
            guidance: GuidanceConfig::default(),
            cache: CacheConfig::default(),
            refresh: RefreshConfig::default(),
            ipfs_gateway: default_ipfs_gateway(),
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl ShareConfig {
    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ShareError::Config(format!("reading {}: {}", path.display(), e)))?;
        let config: ShareConfig = toml::from_str(&raw)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded share configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.participant()?;

        let services = [
            ("gateway", &self.gateway.service),
            ("index", &self.index),
            ("contract", &self.contract),
            ("records", &self.records),
        ];
        for (name, service) in services {
            check_url(name, &service.base_url)?;
        }
        check_url("guidance.endpoint", &self.guidance.endpoint)?;
        check_url("ipfs_gateway", &self.ipfs_gateway)?;

        if self.refresh.interval_secs == 0 {
            return Err(ShareError::Config("refresh.interval_secs must be positive".into()));
        }
        if self.refresh.activity_days == 0 {
            return Err(ShareError::Config("refresh.activity_days must be positive".into()));
        }
        if self.guidance.timeout_secs == 0 {
            return Err(ShareError::Config("guidance.timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// The configured identity, if any
    pub fn participant(&self) -> Result<Option<Address>> {
        self.participant
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(Address::parse_checked)
            .transpose()
    }
}

fn check_url(name: &str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ShareError::Config(format!("{} must be an http(s) URL, got {:?}", name, url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: ShareConfig = toml::from_str("").unwrap();
        config.validate().unwrap();
        assert_eq!(config.gateway.service.base_url, "http://localhost:5001");
        assert_eq!(config.gateway.mode, PinMode::Multipart);
        assert_eq!(config.records.base_url, "http://localhost:3000");
        assert_eq!(config.refresh.interval(), Duration::from_secs(10));
        assert_eq!(config.cache.backend, CacheBackend::Sqlite);
        assert!(config.participant().unwrap().is_none());
    }

    #[test]
    fn test_sections_override_defaults() {
        let config: ShareConfig = toml::from_str(
            r#"
            participant = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
            ipfs_gateway = "https://gateway.pinata.cloud"

            [gateway]
            base_url = "https://pin.example.org"
            mode = "data_url"
            timeout_secs = 120

            [index]
            base_url = "https://index.example.org"

            [cache]
            backend = "memory"

            [refresh]
            interval_secs = 30
            "#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.gateway.mode, PinMode::DataUrl);
        assert_eq!(config.gateway.service.timeout_secs, 120);
        assert_eq!(config.index.timeout_secs, 30);
        assert_eq!(config.contract.base_url, "http://localhost:5001");
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(
            config.participant().unwrap().unwrap().as_str(),
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
        );
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ShareConfig::default();
        config.participant = Some("0x123".into());
        assert!(config.validate().is_err());

        let mut config = ShareConfig::default();
        config.index.base_url = "localhost:5001".into();
        assert!(config.validate().is_err());

        let mut config = ShareConfig::default();
        config.refresh.interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
