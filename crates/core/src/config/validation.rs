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
    /// - `endpoint` is not an http(s) URL
    /// - `cache_ttl_secs` or `poll_interval_ms` is 0
    /// - `user_agent` is empty
    /// - `max_page_bytes` is 0 or exceeds 50MB
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(ConfigError::Invalid {
                    field: "endpoint".into(),
                    reason: format!("unsupported scheme: {}", url.scheme()),
                });
            }
            Err(e) => return Err(ConfigError::Invalid { field: "endpoint".into(), reason: e.to_string() }),
        }

        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "poll_interval_ms".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.max_page_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_page_bytes".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.max_page_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_page_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.mutation_debounce_ms > self.poll_interval_ms {
            tracing::warn!(
                mutation_debounce_ms = self.mutation_debounce_ms,
                poll_interval_ms = self.poll_interval_ms,
                "mutation debounce is longer than the poll interval; polling will usually win"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_endpoint_not_a_url() {
        let config = AppConfig { endpoint: "not a url".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "endpoint"));
    }

    #[test]
    fn test_validate_endpoint_scheme() {
        let config = AppConfig { endpoint: "ftp://example.com/process_address".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "endpoint"));
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = AppConfig { cache_ttl_secs: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_ttl_secs"));
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let config = AppConfig { poll_interval_ms: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "poll_interval_ms"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_page_bytes_limits() {
        let zero = AppConfig { max_page_bytes: 0, ..Default::default() };
        assert!(matches!(zero.validate(), Err(ConfigError::Invalid { field, .. }) if field == "max_page_bytes"));

        let huge = AppConfig { max_page_bytes: 51 * 1024 * 1024, ..Default::default() };
        assert!(matches!(huge.validate(), Err(ConfigError::Invalid { field, .. }) if field == "max_page_bytes"));

        let max = AppConfig { max_page_bytes: 50 * 1024 * 1024, ..Default::default() };
        assert!(max.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_delays_allowed() {
        let config = AppConfig { initial_delay_ms: 0, mutation_debounce_ms: 0, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
