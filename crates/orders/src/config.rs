//! Configuration loading for the order sync engine
//!
//! Store credentials are loaded from (in order of priority):
//! 1. `woocommerce.json` in the ordersync config directory
//! 2. Runtime environment variables (fallback)
//!
//! Sync tuning lives in a separate settings file whose fields all have
//! defaults, so a missing file is not an error.

use anyhow::{Context, Result};
use config::ConfigDir;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Credentials filename in the ordersync config directory
const CREDENTIALS_FILE: &str = "woocommerce.json";

/// Settings filename in the ordersync config directory
const SETTINGS_FILE: &str = "settings.json";

/// REST API namespace used when none is configured
pub const DEFAULT_API_VERSION: &str = "wc/v3";

/// Connection details for a WooCommerce store
#[derive(Debug, Clone, Deserialize)]
pub struct StoreCredentials {
    /// Store root URL, e.g. `https://shop.example.com`
    #[serde(alias = "url")]
    pub base_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl StoreCredentials {
    pub fn new(
        base_url: impl Into<String>,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            api_version: default_api_version(),
        }
    }

    /// Load credentials from the config file, falling back to the environment
    pub fn load() -> Result<Self> {
        match ConfigDir::locate() {
            Some(dir) => Self::load_from(&dir),
            None => Self::from_env(),
        }
    }

    /// Load credentials from `dir`, falling back to the environment when
    /// it has no credentials file
    pub fn load_from(dir: &ConfigDir) -> Result<Self> {
        match dir.load_optional(CREDENTIALS_FILE)? {
            Some(credentials) => Ok(credentials),
            None => Self::from_env(),
        }
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Parse credentials from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse store credentials JSON")
    }

    /// Load credentials from environment variables
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("WOOCOMMERCE_URL")
            .context("WOOCOMMERCE_URL environment variable not set")?;
        let consumer_key = std::env::var("WOOCOMMERCE_CONSUMER_KEY")
            .context("WOOCOMMERCE_CONSUMER_KEY environment variable not set")?;
        let consumer_secret = std::env::var("WOOCOMMERCE_CONSUMER_SECRET")
            .context("WOOCOMMERCE_CONSUMER_SECRET environment variable not set")?;

        Ok(Self::new(base_url, consumer_key, consumer_secret))
    }

    /// Path of the credentials file inside `dir`
    pub fn path_in(dir: &ConfigDir) -> PathBuf {
        dir.file(CREDENTIALS_FILE)
    }
}

/// Tunable sync parameters, in whole seconds as written in the settings file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds to wait between successful polling cycles
    pub sync_interval: u64,
    /// Orders requested per page
    pub per_page: u32,
    /// HTTP request timeout in seconds
    pub request_timeout: u64,
    /// Seconds to back off after a failed cycle
    pub error_backoff: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_interval: 60,
            per_page: 100,
            request_timeout: 30,
            error_backoff: 60,
        }
    }
}

/// On-disk layout of settings.json; sync parameters sit under `app`
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    app: SyncConfig,
}

impl SyncConfig {
    /// Load settings from the config directory, or defaults if absent
    pub fn load() -> Result<Self> {
        match ConfigDir::locate() {
            Some(dir) => Self::load_from(&dir),
            None => Ok(Self::default()),
        }
    }

    /// Load `settings.json` from `dir`, or defaults if it has none
    pub fn load_from(dir: &ConfigDir) -> Result<Self> {
        let settings: SettingsFile = dir.load_or_default(SETTINGS_FILE)?;
        Ok(settings.app)
    }

    /// Load settings from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let settings: SettingsFile = config::load_json_file(path)?;
        Ok(settings.app)
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: SettingsFile =
            serde_json::from_str(json).context("Failed to parse settings JSON")?;
        Ok(settings.app)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_credentials() {
        let json = r#"{
            "base_url": "https://shop.example.com",
            "consumer_key": "ck_test",
            "consumer_secret": "cs_test"
        }"#;

        let creds = StoreCredentials::from_json(json).unwrap();
        assert_eq!(creds.base_url, "https://shop.example.com");
        assert_eq!(creds.consumer_key, "ck_test");
        assert_eq!(creds.consumer_secret, "cs_test");
        assert_eq!(creds.api_version, "wc/v3");
    }

    #[test]
    fn test_parse_credentials_url_alias_and_version() {
        let json = r#"{
            "url": "https://shop.example.com",
            "consumer_key": "ck",
            "consumer_secret": "cs",
            "api_version": "wc/v2"
        }"#;

        let creds = StoreCredentials::from_json(json).unwrap();
        assert_eq!(creds.base_url, "https://shop.example.com");
        assert_eq!(creds.api_version, "wc/v2");
    }

    #[test]
    fn test_invalid_credentials() {
        assert!(StoreCredentials::from_json(r#"{ "base_url": "x" }"#).is_err());
    }

    #[test]
    fn test_sync_config_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.sync_interval, 60);
        assert_eq!(config.per_page, 100);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.error_backoff, 60);
    }

    #[test]
    fn test_sync_config_partial_settings() {
        let config = SyncConfig::from_json(r#"{ "app": { "sync_interval": 15 } }"#).unwrap();
        assert_eq!(config.sync_interval, 15);
        assert_eq!(config.per_page, 100);

        let empty = SyncConfig::from_json("{}").unwrap();
        assert_eq!(empty, SyncConfig::default());
    }

    #[test]
    fn test_sync_config_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "app": { "per_page": 50, "error_backoff": 5 } }"#).unwrap();

        let config = SyncConfig::from_file(&path).unwrap();
        assert_eq!(config.per_page, 50);
        assert_eq!(config.error_backoff, 5);
        assert_eq!(config.sync_interval, 60);
    }

    #[test]
    fn test_sync_config_load_from_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = ConfigDir::at(tmp.path());

        // No settings file yet
        assert_eq!(SyncConfig::load_from(&dir).unwrap(), SyncConfig::default());

        std::fs::write(dir.file("settings.json"), r#"{ "app": { "sync_interval": 5 } }"#).unwrap();
        assert_eq!(SyncConfig::load_from(&dir).unwrap().sync_interval, 5);

        std::fs::write(dir.file("settings.json"), "{ broken").unwrap();
        assert!(SyncConfig::load_from(&dir).is_err());
    }

    #[test]
    fn test_credentials_load_from_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = ConfigDir::at(tmp.path());
        std::fs::write(
            dir.file("woocommerce.json"),
            r#"{ "url": "https://shop.example.com", "consumer_key": "ck", "consumer_secret": "cs" }"#,
        )
        .unwrap();

        let creds = StoreCredentials::load_from(&dir).unwrap();
        assert_eq!(creds.base_url, "https://shop.example.com");
        assert_eq!(creds.consumer_key, "ck");
    }

    #[test]
    fn test_credentials_path_in_dir() {
        let dir = ConfigDir::at("/srv/shop");
        assert_eq!(
            StoreCredentials::path_in(&dir),
            PathBuf::from("/srv/shop/woocommerce.json")
        );
    }

    #[test]
    fn test_invalid_credentials_file_does_not_fall_back() {
        let tmp = TempDir::new().unwrap();
        let dir = ConfigDir::at(tmp.path());
        std::fs::write(dir.file("woocommerce.json"), r#"{ "url": "x" }"#).unwrap();

        let err = StoreCredentials::load_from(&dir).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }
}
