//! Configuration directory for ordersync applications
//!
//! All ordersync settings live as JSON files in one directory, by default
//! `~/.config/ordersync/`. Setting `ORDERSYNC_CONFIG_DIR` points every
//! application at a different directory, e.g. one per store.
//!
//! Call [`init`] at application startup to bootstrap the config directory.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "ORDERSYNC_CONFIG_DIR";

/// Name of the directory under the platform config dir
const APP_DIR: &str = "ordersync";

/// A directory of JSON config files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDir {
    root: PathBuf,
}

impl ConfigDir {
    /// The directory in use: `ORDERSYNC_CONFIG_DIR` if set, else the
    /// platform default
    ///
    /// Returns `None` when the platform has no config directory.
    pub fn locate() -> Option<Self> {
        Self::resolve(std::env::var_os(CONFIG_DIR_ENV))
    }

    fn resolve(override_dir: Option<OsString>) -> Option<Self> {
        match override_dir {
            Some(dir) if !dir.is_empty() => Some(Self::at(dir)),
            _ => dirs::config_dir().map(|p| Self::at(p.join(APP_DIR))),
        }
    }

    /// Use an explicit directory
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a file inside this directory
    pub fn file(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.file(filename).exists()
    }

    /// Create the directory (and parents) if missing
    pub fn ensure(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.root).with_context(|| {
            format!("Failed to create config directory: {}", self.root.display())
        })?;
        Ok(&self.root)
    }

    /// Load and parse a JSON file from this directory
    pub fn load<T: DeserializeOwned>(&self, filename: &str) -> Result<T> {
        load_json_file(&self.file(filename))
    }

    /// Like [`load`](Self::load), but a missing file is `Ok(None)`
    ///
    /// A file that exists but fails to parse is still an error.
    pub fn load_optional<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>> {
        if self.contains(filename) {
            self.load(filename).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Load a JSON file if present, otherwise `T::default()`
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, filename: &str) -> Result<T> {
        Ok(self.load_optional(filename)?.unwrap_or_default())
    }
}

/// Initialize the ordersync config directory.
///
/// Creates the directory from [`ConfigDir::locate`] if it doesn't exist.
/// Call this once at application startup.
pub fn init() -> Result<ConfigDir> {
    let dir = ConfigDir::locate().context("Could not determine config directory")?;
    dir.ensure()?;
    Ok(dir)
}

/// Load and parse a JSON file from an arbitrary path
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}
