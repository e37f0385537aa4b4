//! CLI configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use biocloud_common::TimeDisplay;

use crate::guard::GuardPolicy;
use crate::vm::PollSettings;

/// CLI configuration, read from `<store>/config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Backend base URL
    pub api_base_url: String,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// Fixed UTC offset used to display timestamps, e.g. "+01:00"
    pub display_utc_offset: String,

    /// How protected commands check the stored session
    pub guard_policy: GuardPolicy,

    /// Endpoint used to validate the token
    pub validation_path: String,

    /// VM status polling
    pub poll_interval_secs: u64,
    pub poll_attempts: u32,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            request_timeout_secs: 30,
            display_utc_offset: "+01:00".to_string(),
            guard_policy: GuardPolicy::ServerValidation,
            validation_path: "/user/profile".to_string(),
            poll_interval_secs: 5,
            poll_attempts: 24,
        }
    }
}

impl CliConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn time_display(&self) -> biocloud_common::Result<TimeDisplay> {
        TimeDisplay::from_offset_str(&self.display_utc_offset)
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(self.poll_interval_secs),
            attempts: self.poll_attempts.max(1),
        }
    }
}

/// Paths under the store directory
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub root: PathBuf,
}

impl StorePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn config(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn session(&self) -> PathBuf {
        self.root.join("session.json")
    }
}

impl Default for StorePaths {
    fn default() -> Self {
        Self::new(biocloud_common::default_store_path())
    }
}
