//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (YADZ_*)
//! 2. TOML config file (if YADZ_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (YADZ_*)
/// 2. TOML config file (if YADZ_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address lookup endpoint.
    ///
    /// Set via YADZ_ENDPOINT environment variable.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Path to SQLite cache database.
    ///
    /// Set via YADZ_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// How long a successful lookup stays cached, in seconds.
    ///
    /// Set via YADZ_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Delay before the first scan of a page.
    ///
    /// Set via YADZ_INITIAL_DELAY_MS environment variable.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Settle time after a mutation that added nodes.
    ///
    /// Set via YADZ_MUTATION_DEBOUNCE_MS environment variable.
    #[serde(default = "default_mutation_debounce_ms")]
    pub mutation_debounce_ms: u64,

    /// Fallback rescan interval.
    ///
    /// Set via YADZ_POLL_INTERVAL_MS environment variable.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Emit per-scan verbose logging.
    ///
    /// Set via YADZ_VERBOSE environment variable.
    #[serde(default)]
    pub verbose: bool,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via YADZ_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes accepted when fetching a page.
    ///
    /// Set via YADZ_MAX_PAGE_BYTES environment variable.
    #[serde(default = "default_max_page_bytes")]
    pub max_page_bytes: usize,
}

fn default_endpoint() -> String {
    "https://gcp.gtelem.com/process_address".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./yadz-cache.sqlite")
}

fn default_cache_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_mutation_debounce_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_user_agent() -> String {
    "yadz/0.1".into()
}

fn default_max_page_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            db_path: default_db_path(),
            cache_ttl_secs: default_cache_ttl_secs(),
            initial_delay_ms: default_initial_delay_ms(),
            mutation_debounce_ms: default_mutation_debounce_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            verbose: false,
            user_agent: default_user_agent(),
            max_page_bytes: default_max_page_bytes(),
        }
    }
}

impl AppConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn mutation_debounce(&self) -> Duration {
        Duration::from_millis(self.mutation_debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `YADZ_`
    /// 2. TOML file from `YADZ_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("YADZ_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("YADZ_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
