//! Host configuration.
//!
//! Read from a JSON file; every field has a default so a partial (or
//! missing) file is fine. A handful of environment variables override the
//! file for quick local runs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HostError, Result};
use twofold_totp::totp::ExportFormat;

pub const ENV_STORAGE_PATH: &str = "TWOFOLD_STORAGE_PATH";
pub const ENV_LOG_LEVEL: &str = "TWOFOLD_LOG_LEVEL";
pub const ENV_TICK_SECS: &str = "TWOFOLD_TICK_SECS";

/// Main host configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Where the account list is persisted
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
    /// Default level when `RUST_LOG` is unset (e.g. "info", "twofold=debug")
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,
    /// Seconds between code refreshes; never below 1
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    /// Format used when the user does not pick one
    #[serde(default)]
    pub default_export_format: ExportFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            log_level: default_log_level(),
            log_json: false,
            tick_interval_secs: default_tick_interval(),
            default_export_format: ExportFormat::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, then apply environment overrides.
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config.normalized())
    }

    /// Parse a config file without environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("config: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| HostError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply overrides from a key lookup (the process environment in
    /// [`load`](Self::load)). Unparseable numbers are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_STORAGE_PATH).filter(|p| !p.is_empty()) {
            self.storage_path = PathBuf::from(path);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|l| !l.is_empty()) {
            self.log_level = level;
        }
        if let Some(raw) = lookup(ENV_TICK_SECS) {
            match raw.parse() {
                Ok(secs) => self.tick_interval_secs = secs,
                Err(_) => log::warn!("config: ignoring non-numeric {}={}", ENV_TICK_SECS, raw),
            }
        }
    }

    fn normalized(mut self) -> Self {
        self.tick_interval_secs = self.tick_interval_secs.max(1);
        self
    }

    /// Tick interval as a `Duration`, clamped to at least one second.
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tick_interval_secs.max(1))
    }
}

fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("twofold")
        .join("accounts.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_interval() -> u64 {
    1
}
