//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SIGCACHE_*)
//! 2. TOML config file (if SIGCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::signature::BuilderConfig;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SIGCACHE_*)
/// 2. TOML config file (if SIGCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Lifetime of a cached locator in milliseconds.
    ///
    /// Set via SIGCACHE_SELECTOR_TTL_MS environment variable.
    #[serde(default = "default_selector_ttl_ms")]
    pub selector_ttl_ms: u64,

    /// Lifetime of a memoized page signature in milliseconds.
    ///
    /// Also used as the signature sweep interval.
    /// Set via SIGCACHE_SIGNATURE_TTL_MS environment variable.
    #[serde(default = "default_signature_ttl_ms")]
    pub signature_ttl_ms: u64,

    /// Interval of the store's background cleanup in milliseconds.
    ///
    /// Set via SIGCACHE_CLEANUP_INTERVAL_MS environment variable.
    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: u64,

    /// Store size budget in megabytes.
    ///
    /// Set via SIGCACHE_MAX_SIZE_MB environment variable.
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,

    /// Maximum number of elements hashed per signature tier.
    ///
    /// Set via SIGCACHE_MAX_ELEMENTS_PER_TIER environment variable.
    #[serde(default = "default_max_elements_per_tier")]
    pub max_elements_per_tier: usize,

    /// Whether element text takes part in signature tokens.
    #[serde(default = "default_true")]
    pub include_text: bool,

    /// Whether element position takes part in signature tokens.
    #[serde(default)]
    pub include_position: bool,

    /// Minimum intent-text likeness for a fuzzy candidate.
    #[serde(default = "default_min_intent_similarity")]
    pub min_intent_similarity: f64,

    /// Whether fuzzy lookups may consider entries captured on other hosts.
    #[serde(default = "default_true")]
    pub cross_env_enabled: bool,

    /// Score penalty applied to same-path, different-host comparisons.
    #[serde(default = "default_cross_env_penalty")]
    pub cross_env_penalty: f64,

    /// Whether entries are persisted to SQLite.
    ///
    /// Set via SIGCACHE_PERSIST environment variable.
    #[serde(default)]
    pub persist: bool,

    /// Path to the SQLite cache database.
    ///
    /// Set via SIGCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Whether live page extraction (headless browser) is enabled.
    ///
    /// Set via SIGCACHE_RENDER_ENABLED environment variable.
    #[serde(default)]
    pub render_enabled: bool,
}

fn default_selector_ttl_ms() -> u64 {
    300_000 // 5 minutes
}

fn default_signature_ttl_ms() -> u64 {
    60_000
}

fn default_cleanup_interval_ms() -> u64 {
    60_000
}

fn default_max_size_mb() -> u64 {
    50
}

fn default_max_elements_per_tier() -> usize {
    50
}

fn default_min_intent_similarity() -> f64 {
    0.5
}

fn default_cross_env_penalty() -> f64 {
    0.1
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./sigcache.sqlite")
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            selector_ttl_ms: default_selector_ttl_ms(),
            signature_ttl_ms: default_signature_ttl_ms(),
            cleanup_interval_ms: default_cleanup_interval_ms(),
            max_size_mb: default_max_size_mb(),
            max_elements_per_tier: default_max_elements_per_tier(),
            include_text: true,
            include_position: false,
            min_intent_similarity: default_min_intent_similarity(),
            cross_env_enabled: true,
            cross_env_penalty: default_cross_env_penalty(),
            persist: false,
            db_path: default_db_path(),
            render_enabled: false,
        }
    }
}

impl AppConfig {
    /// Selector TTL as Duration.
    pub fn selector_ttl(&self) -> Duration {
        Duration::from_millis(self.selector_ttl_ms)
    }

    /// Signature TTL as Duration.
    pub fn signature_ttl(&self) -> Duration {
        Duration::from_millis(self.signature_ttl_ms)
    }

    /// Cleanup interval as Duration.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }

    /// Size budget in bytes.
    pub fn max_size_bytes(&self) -> usize {
        (self.max_size_mb as usize).saturating_mul(1024 * 1024)
    }

    /// Signature builder settings derived from this configuration.
    pub fn builder_config(&self) -> BuilderConfig {
        BuilderConfig {
            max_elements_per_tier: self.max_elements_per_tier,
            include_text: self.include_text,
            include_position: self.include_position,
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SIGCACHE_`
    /// 2. TOML file from `SIGCACHE_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("SIGCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SIGCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Database path when persistence is enabled.
    pub fn persistence_path(&self) -> Option<&PathBuf> {
        self.persist.then_some(&self.db_path)
    }
}
