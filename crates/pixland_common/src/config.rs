//! Pixland Configuration
//!
//! Configuration lives in `pixland.toml` (override with `$PIXLAND_CONFIG`).
//! Every field has a default, so a missing file or a partial file is fine.

use crate::error::PixlandError;
use crate::progression::{LevelTable, LevelTableError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "pixland.toml";
const CONFIG_ENV: &str = "PIXLAND_CONFIG";

/// Grid settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSettings {
    /// Largest coordinate on either axis, must be 2^n - 1
    #[serde(default = "default_max_value")]
    pub max_value: u64,
}

fn default_max_value() -> u64 {
    1023
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            max_value: default_max_value(),
        }
    }
}

/// Job poller settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerSettings {
    /// Wait before the second attempt; doubles afterwards (valid: 10-60000)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Retries after the first check (valid: 0-16)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Status tags that mean the job is done
    #[serde(default = "default_complete_statuses")]
    pub complete_statuses: Vec<String>,
}

fn default_base_delay_ms() -> u64 {
    3000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_complete_statuses() -> Vec<String> {
    vec!["SUCCESS".to_string(), "complete".to_string()]
}

impl PollerSettings {
    pub fn effective_base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms.clamp(10, 60_000))
    }

    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.min(crate::poller::MAX_ATTEMPTS_CEILING)
    }

    pub fn base_delay_was_clamped(&self) -> bool {
        Duration::from_millis(self.base_delay_ms) != self.effective_base_delay()
    }
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_attempts: default_max_attempts(),
            complete_statuses: default_complete_statuses(),
        }
    }
}

/// Canvas API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path segment in front of the job id
    #[serde(default = "default_job_status_path")]
    pub job_status_path: String,

    /// Per-request timeout (valid: 1-120)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_job_status_path() -> String {
    "images/status".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.clamp(1, 120))
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            job_status_path: default_job_status_path(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// Filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Progression settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProgressionSettings {
    /// Custom level table; the built-in table is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels_file: Option<PathBuf>,
}

impl ProgressionSettings {
    pub fn level_table(&self) -> Result<LevelTable, LevelTableError> {
        match &self.levels_file {
            Some(path) => LevelTable::load(path),
            None => Ok(LevelTable::standard()),
        }
    }
}

/// Complete Pixland configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PixlandConfig {
    #[serde(default)]
    pub grid: GridSettings,

    #[serde(default)]
    pub poller: PollerSettings,

    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub log: LogSettings,

    #[serde(default)]
    pub progression: ProgressionSettings,
}

impl PixlandConfig {
    /// Load from `path`, failing on unreadable or malformed files
    pub fn load_from(path: &Path) -> Result<Self, PixlandError> {
        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path`, using defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, PixlandError> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}
