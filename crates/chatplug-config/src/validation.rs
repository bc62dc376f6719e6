// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths and sane timeouts.

use crate::diagnostic::ConfigError;
use crate::model::ChatplugConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ChatplugConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.service.log_level
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let base_url = config.ai.api_base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "ai.api_base_url must not be empty".to_string(),
        });
    } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("ai.api_base_url must be an http(s) URL, got `{base_url}`"),
        });
    }

    if config.ai.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "ai.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.ai.max_tokens == 0 {
        errors.push(ConfigError::Validation {
            message: "ai.max_tokens must be at least 1".to_string(),
        });
    }

    if config.resolver.fallback_reply.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "resolver.fallback_reply must not be empty".to_string(),
        });
    }

    if config.resolver.transcript_limit < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "resolver.transcript_limit must be at least 1, got {}",
                config.resolver.transcript_limit
            ),
        });
    }

    if config.widget.default_welcome_message.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "widget.default_welcome_message must not be empty".to_string(),
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
        let config = ChatplugConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = ChatplugConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))));
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let mut config = ChatplugConfig::default();
        config.ai.request_timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("request_timeout_secs"))));
    }

    #[test]
    fn non_http_base_url_fails_validation() {
        let mut config = ChatplugConfig::default();
        config.ai.api_base_url = "ftp://example.com".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("api_base_url"))));
    }

    #[test]
    fn blank_fallback_reply_fails_validation() {
        let mut config = ChatplugConfig::default();
        config.resolver.fallback_reply = "   ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("fallback_reply"))));
    }

    #[test]
    fn invalid_log_level_fails_validation() {
        let mut config = ChatplugConfig::default();
        config.service.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("log_level"))));
    }

    #[test]
    fn multiple_errors_collected() {
        let mut config = ChatplugConfig::default();
        config.storage.database_path = String::new();
        config.resolver.transcript_limit = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
