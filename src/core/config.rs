//! Application configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::fetcher::FetcherConfig;
use crate::core::launcher::DEFAULT_PLAYER_SCHEME;

/// One day, the cadence of the background refresh
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 24 * 60 * 60;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main application configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub launch: LaunchConfig,
    pub advanced: AdvancedConfig,
}

/// Where the playlist comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    pub endpoint: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

/// Local playlist cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Defaults to `videos.json` in the data directory
    pub cache_file: Option<String>,
    pub persist: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub refresh_on_start: bool,
    /// `None` disables the background schedule
    pub refresh_interval_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchConfig {
    pub player_scheme: String,
    pub open_on_click: bool,
}

/// Advanced configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedConfig {
    pub log_level: String, // "error", "warn", "info", "debug", "trace"
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://android-kotlin-fun-mars-server.appspot.com/".to_string(),
            endpoint: "devbytes".to_string(),
            timeout_seconds: 30,
            user_agent: crate::utils::network::get_user_agent().to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_file: None,
            persist: true,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            refresh_on_start: true,
            refresh_interval_seconds: Some(DEFAULT_REFRESH_INTERVAL_SECS),
        }
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            player_scheme: DEFAULT_PLAYER_SCHEME.to_string(),
            open_on_click: true,
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file, creating default if not exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config: AppConfig =
                serde_json::from_str(&content).with_context(|| "Failed to parse config file")?;

            tracing::info!("Loaded configuration from: {:?}", config_path);
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            tracing::info!("Created default configuration at: {:?}", config_path);
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = self.export()?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved configuration to: {:?}", config_path);
        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "example", "devbyteviewer")
            .with_context(|| "Failed to get project directories")
    }

    /// Get the path to the configuration file
    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.json"))
    }

    /// Get the application data directory
    pub fn get_data_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    /// Export configuration as JSON string
    pub fn export(&self) -> Result<String> {
        serde_json::to_string_pretty(self).with_context(|| "Failed to export configuration")
    }

    /// Parse and validate configuration from a JSON string
    pub fn import(json: &str) -> Result<Self> {
        let config: AppConfig =
            serde_json::from_str(json).with_context(|| "Failed to parse imported configuration")?;

        config
            .validate()
            .with_context(|| "Imported configuration is invalid")?;

        Ok(config)
    }

    /// Absolute URL of the playlist resource
    pub fn endpoint_url(&self) -> Result<String> {
        let base = crate::utils::validation::validate_url(&self.remote.base_url)?;
        let url = base
            .join(&self.remote.endpoint)
            .with_context(|| format!("Invalid endpoint: {}", self.remote.endpoint))?;
        Ok(url.to_string())
    }

    pub fn fetcher_config(&self) -> Result<FetcherConfig> {
        Ok(FetcherConfig {
            endpoint: self.endpoint_url()?,
            timeout: self.remote.timeout_seconds,
            user_agent: self.remote.user_agent.clone(),
        })
    }

    /// Playlist cache location, `None` when persistence is off
    pub fn cache_path(&self) -> Result<Option<PathBuf>> {
        if !self.storage.persist {
            return Ok(None);
        }
        match &self.storage.cache_file {
            Some(file) => Ok(Some(PathBuf::from(file))),
            None => Ok(Some(Self::get_data_dir()?.join("videos.json"))),
        }
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.sync.refresh_interval_seconds.map(Duration::from_secs)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint_url()?;
        if !crate::utils::validation::is_http_url(&endpoint) {
            anyhow::bail!("Endpoint must be an http(s) URL: {}", endpoint);
        }

        if self.remote.timeout_seconds == 0 || self.remote.timeout_seconds > 300 {
            anyhow::bail!("Timeout should be between 1 and 300 seconds");
        }

        if self.remote.user_agent.trim().is_empty() {
            anyhow::bail!("User agent must not be empty");
        }

        if let Some(ref file) = self.storage.cache_file {
            if file.trim().is_empty() {
                anyhow::bail!("Cache file path must not be empty");
            }
        }

        if self.sync.refresh_interval_seconds == Some(0) {
            anyhow::bail!("Refresh interval must be greater than 0");
        }

        if !crate::utils::validation::is_valid_scheme(&self.launch.player_scheme) {
            anyhow::bail!("Invalid player scheme: {}", self.launch.player_scheme);
        }

        if !LOG_LEVELS.contains(&self.advanced.log_level.as_str()) {
            anyhow::bail!(
                "Invalid log level: must be 'error', 'warn', 'info', 'debug', or 'trace'"
            );
        }

        Ok(())
    }
}
