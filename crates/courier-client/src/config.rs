//! # Client Configuration
//!
//! Configuration management for the courier client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     COURIER_API_URL=https://api.example.com/api/v1                     │
//! │     COURIER_API_TIMEOUT_SECS=15                                        │
//! │     COURIER_DB_PATH=/data/courier.db                                   │
//! │     COURIER_HISTORY_PAGE_SIZE=50                                       │
//! │     COURIER_DEVICE_ID=abc-123                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/courier/courier.toml (Linux)                             │
//! │     ~/Library/Application Support/com.courier.partner/courier.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! base_url = "http://192.168.1.10:8081/api/v1"
//! timeout_secs = 10
//!
//! [storage]
//! database_path = "/home/ravi/.local/share/courier/courier.db"
//!
//! [orders]
//! history_page_size = 20
//! earnings_history_limit = 50
//!
//! [device]
//! id = "550e8400-e29b-41d4-a716-446655440000"
//! name = "Ravi's phone"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// API Settings
// =============================================================================

/// Where the delivery backend lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL including the version prefix, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8081/api/v1".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Storage Settings
// =============================================================================

/// Where the credential database lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "courier", "partner")
        .map(|dirs| dirs.data_dir().join("courier.db"))
        .unwrap_or_else(|| PathBuf::from("courier.db"))
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            database_path: default_database_path(),
        }
    }
}

// =============================================================================
// Order Settings
// =============================================================================

/// Paging for the order and earnings lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSettings {
    /// Orders fetched per history refresh.
    #[serde(default = "default_history_page_size")]
    pub history_page_size: u32,

    /// Entries fetched for the earnings history list.
    #[serde(default = "default_earnings_history_limit")]
    pub earnings_history_limit: u32,
}

fn default_history_page_size() -> u32 {
    20
}

fn default_earnings_history_limit() -> u32 {
    50
}

impl Default for OrderSettings {
    fn default() -> Self {
        OrderSettings {
            history_page_size: default_history_page_size(),
            earnings_history_limit: default_earnings_history_limit(),
        }
    }
}

// =============================================================================
// Device Configuration
// =============================================================================

/// Configuration for this device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Unique device identifier (UUID v4).
    /// Auto-generated on first run if not provided.
    pub id: String,

    /// Human-readable device name.
    #[serde(default = "default_device_name")]
    pub name: String,
}

fn default_device_name() -> String {
    "Courier Device".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            id: Uuid::new_v4().to_string(),
            name: default_device_name(),
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub orders: OrderSettings,

    #[serde(default)]
    pub device: DeviceConfig,
}

impl ClientConfig {
    /// Creates a new config with defaults and a generated device ID.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (courier.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = &self.api.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::InvalidConfig(format!(
                "API URL must start with http:// or https://, got: {}",
                url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.orders.history_page_size == 0 {
            return Err(ClientError::InvalidConfig(
                "history_page_size must be greater than 0".into(),
            ));
        }

        if self.orders.earnings_history_limit == 0 {
            return Err(ClientError::InvalidConfig(
                "earnings_history_limit must be greater than 0".into(),
            ));
        }

        if self.device.id.is_empty() {
            return Err(ClientError::InvalidConfig("device id is empty".into()));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("COURIER_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(timeout) = std::env::var("COURIER_API_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.api.timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring invalid COURIER_API_TIMEOUT_SECS"),
            }
        }

        if let Ok(path) = std::env::var("COURIER_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = PathBuf::from(path);
        }

        if let Ok(size) = std::env::var("COURIER_HISTORY_PAGE_SIZE") {
            match size.parse::<u32>() {
                Ok(n) => self.orders.history_page_size = n,
                Err(_) => warn!(value = %size, "Ignoring invalid COURIER_HISTORY_PAGE_SIZE"),
            }
        }

        if let Ok(id) = std::env::var("COURIER_DEVICE_ID") {
            debug!(device_id = %id, "Overriding device ID from environment");
            self.device.id = id;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "courier", "partner")
            .map(|dirs| dirs.config_dir().join("courier.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn device_id(&self) -> &str {
        &self.device.id
    }

    pub fn base_url(&self) -> &str {
        &self.api.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(!config.device.id.is_empty());
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.orders.history_page_size, 20);
        assert_eq!(config.orders.earnings_history_limit, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.api.base_url = "ftp://backend".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "https://backend/api/v1".to_string();
        config.orders.history_page_size = 0;
        assert!(config.validate().is_err());

        config.orders.history_page_size = 10;
        config.api.timeout_secs = 0;
        assert!(config.validate().unwrap_err().is_config_error());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "http://10.0.0.2:8081/api/v1"

            [device]
            id = "dev-1"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://10.0.0.2:8081/api/v1");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.device.name, "Courier Device");
        assert_eq!(config.orders.history_page_size, 20);
    }

    #[test]
    fn test_save_then_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("courier.toml");

        let mut config = ClientConfig::default();
        config.orders.history_page_size = 35;
        config.save(Some(path.clone())).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[api]"));
        assert!(text.contains("history_page_size = 35"));

        let loaded: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(loaded.device.id, config.device.id);
    }
}
