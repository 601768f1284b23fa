use std::path::{Path, PathBuf};
use std::time::Duration;

use compass_api::{MealDbClient, RetryConfig, DEFAULT_BASE_URL};
use compass_cache::SlotPolicy;
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "culinary-compass";

/// Upper bounds that keep expiry arithmetic inside chrono's range
const MAX_RETENTION_DAYS: i64 = 100 * 365;
const MAX_TTL_HOURS: i64 = 10 * 365 * 24;

/// Main configuration structure
///
/// Loaded from `config.toml` in the platform config directory. Every
/// section and field has a default, so a partial file is fine and a
/// missing file means "all defaults".
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub favorites: FavoritesConfig,
    pub cache: CacheConfig,
    pub ui: UiConfig,
}

impl Config {
    /// Load config from the default location, or defaults if there is none
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject values that parse but cannot be used
    pub fn validate(&self) -> crate::Result<()> {
        let retention = self.favorites.retention_days;
        if !(1..=MAX_RETENTION_DAYS).contains(&retention) {
            return Err(crate::Error::ConfigError(format!(
                "favorites.retention_days must be between 1 and {}, got {}",
                MAX_RETENTION_DAYS, retention
            )));
        }

        let ttl = self.cache.ttl_hours;
        if !(0..=MAX_TTL_HOURS).contains(&ttl) {
            return Err(crate::Error::ConfigError(format!(
                "cache.ttl_hours must be between 0 and {}, got {}",
                MAX_TTL_HOURS, ttl
            )));
        }

        Ok(())
    }

    /// Save config to the default location
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// XDG config dir on Linux, Application Support on macOS, AppData on Windows
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join(APP_DIR);

        Ok(config_dir.join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// API root, ending in `/`. Paid keys use `.../api/json/v2/<key>/`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts for transient failures (5xx, 429, timeouts)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8000
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl CatalogConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            initial_delay_ms: self.initial_delay_ms,
            max_delay_ms: self.max_delay_ms,
            ..RetryConfig::default()
        }
    }

    pub fn client(&self) -> MealDbClient {
        MealDbClient::with_options(
            self.base_url.clone(),
            Duration::from_secs(self.timeout_secs),
        )
        .with_retry_config(self.retry_config())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoritesConfig {
    /// Name of the storage slot holding the list
    #[serde(default = "default_slot_name")]
    pub slot_name: String,

    /// Days the list survives without being written
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    /// Upper bound on the serialized list
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_slot_name() -> String {
    "favorites".to_string()
}

fn default_retention_days() -> i64 {
    365
}

fn default_max_bytes() -> usize {
    64 * 1024
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            slot_name: default_slot_name(),
            retention_days: default_retention_days(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl FavoritesConfig {
    pub fn slot_policy(&self) -> SlotPolicy {
        SlotPolicy {
            // Out of range saturates; the cache then refuses the write
            retention: chrono::Duration::try_days(self.retention_days)
                .unwrap_or(chrono::Duration::MAX),
            max_bytes: self.max_bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Keep fetched recipes locally
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Cache TTL in hours
    #[serde(default = "default_cache_ttl")]
    pub ttl_hours: i64,

    /// Database file; defaults to the platform data directory
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> i64 {
    24 // recipes barely change
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_hours: default_cache_ttl(),
            db_path: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.ttl_hours).unwrap_or(chrono::Duration::MAX)
    }

    pub fn resolved_db_path(&self) -> crate::Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?
            .join(APP_DIR);

        Ok(data_dir.join("compass.db"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Random recipes shown on an empty home screen
    #[serde(default = "default_suggestions")]
    pub suggestions: usize,

    #[serde(default = "default_mouse")]
    pub mouse_enabled: bool,
}

fn default_suggestions() -> usize {
    crate::browse::DEFAULT_SUGGESTIONS
}

fn default_mouse() -> bool {
    false
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            suggestions: default_suggestions(),
            mouse_enabled: default_mouse(),
        }
    }
}
