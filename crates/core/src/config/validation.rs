//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - any TTL or the cleanup interval is 0
    /// - `max_size_mb` is 0 or exceeds 1024
    /// - `max_elements_per_tier` is 0 or exceeds 1000
    /// - `min_intent_similarity` or `cross_env_penalty` is outside [0, 1]
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("selector_ttl_ms", self.selector_ttl_ms),
            ("signature_ttl_ms", self.signature_ttl_ms),
            ("cleanup_interval_ms", self.cleanup_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must be greater than 0".into() });
            }
        }

        if self.max_size_mb == 0 {
            return Err(ConfigError::Invalid { field: "max_size_mb".into(), reason: "must be greater than 0".into() });
        }
        if self.max_size_mb > 1024 {
            return Err(ConfigError::Invalid { field: "max_size_mb".into(), reason: "must not exceed 1024MB".into() });
        }

        if self.max_elements_per_tier == 0 || self.max_elements_per_tier > 1000 {
            return Err(ConfigError::Invalid {
                field: "max_elements_per_tier".into(),
                reason: "must be between 1 and 1000".into(),
            });
        }

        for (field, value) in
            [("min_intent_similarity", self.min_intent_similarity), ("cross_env_penalty", self.cross_env_penalty)]
        {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must be within [0, 1]".into() });
            }
        }

        if self.cleanup_interval_ms > self.selector_ttl_ms {
            tracing::warn!(
                cleanup_interval_ms = self.cleanup_interval_ms,
                selector_ttl_ms = self.selector_ttl_ms,
                "cleanup_interval_ms exceeds selector_ttl_ms; \
                 expired entries linger until the next sweep"
            );
        }

        Ok(())
    }
}
