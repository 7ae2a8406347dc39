// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, positive intervals, and URL schemes.

use crate::diagnostic::ConfigError;
use crate::model::CourierConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if let Some(url) = &config.webhook.url {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(ConfigError::Validation {
                message: format!("webhook.url `{url}` must start with http:// or https://"),
            });
        }
    }

    if config.webhook.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "webhook.timeout_secs must be at least 1".to_string(),
        });
    }

    if config.dispatch.batch_size == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatch.batch_size must be at least 1".to_string(),
        });
    }

    if config.dispatch.interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatch.interval_secs must be at least 1".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.cache.ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "cache.ttl_secs must be at least 1".to_string(),
        });
    }

    let level = config.logging.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = CourierConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn missing_webhook_url_is_not_a_startup_error() {
        let mut config = CourierConfig::default();
        config.webhook.url = None;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn non_http_webhook_url_fails_validation() {
        let mut config = CourierConfig::default();
        config.webhook.url = Some("ftp://hooks.example.com".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("webhook.url"));
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = CourierConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("database_path"));
    }

    #[test]
    fn zero_batch_size_fails_validation() {
        let mut config = CourierConfig::default();
        config.dispatch.batch_size = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("dispatch.batch_size"));
    }

    #[test]
    fn zero_throttle_is_allowed() {
        let mut config = CourierConfig::default();
        config.dispatch.throttle_ms = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = CourierConfig::default();
        config.logging.level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("logging.level"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = CourierConfig::default();
        config.dispatch.batch_size = 0;
        config.dispatch.interval_secs = 0;
        config.webhook.timeout_secs = 0;
        config.cache.ttl_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
