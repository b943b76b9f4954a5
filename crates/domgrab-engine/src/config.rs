//! Configuration: picker debug settings plus the protocol timing constants.
//!
//! Loaded from `./domgrab.yaml`, then `~/.domgrab/config.yaml`, then
//! defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Panel-side resolution settings, persisted across sessions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugSettings {
    /// Enable the permissive substring/prefix resolution tier.
    pub use_simple_selectors: bool,
    /// Allow one fallback-selector retry after ElementNotFound.
    pub try_fallback_selectors: bool,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            use_simple_selectors: true,
            try_fallback_selectors: true,
        }
    }
}

/// Wall-clock bounds governing the cross-context protocol. Expiry always
/// resolves to a degraded-but-valid result; nothing in flight is cancelled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Liveness-probe bound.
    pub probe_timeout_ms: u64,
    /// Settle delay between script injection and the single retry.
    pub settle_delay_ms: u64,
    /// Wait for the asynchronous final listener result after a preliminary.
    pub final_wait_ms: u64,
    /// Panel-side periodic connection re-check.
    pub connection_check_period_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 500,
            settle_delay_ms: 100,
            final_wait_ms: 1500,
            connection_check_period_ms: 10_000,
        }
    }
}

impl TimingConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
    pub fn final_wait(&self) -> Duration {
        Duration::from_millis(self.final_wait_ms)
    }
    pub fn connection_check_period(&self) -> Duration {
        Duration::from_millis(self.connection_check_period_ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureLimits {
    /// Inline script content is truncated to this many characters.
    pub max_inline_script_len: usize,
}

impl Default for CaptureLimits {
    fn default() -> Self {
        Self {
            max_inline_script_len: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DomgrabConfig {
    pub picker: DebugSettings,
    pub timing: TimingConfig,
    pub capture: CaptureLimits,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./domgrab.yaml
    /// 2. ~/.domgrab/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<DomgrabConfig, ConfigError> {
        let local_config = PathBuf::from("./domgrab.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".domgrab").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(DomgrabConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<DomgrabConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: DomgrabConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
