// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde attributes cannot express: non-empty
//! paths, non-zero intervals, and a recognized log level. Collects every
//! failure instead of stopping at the first.

use crate::diagnostic::ConfigError;
use crate::model::AdwatchConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &AdwatchConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.daemon.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "daemon.log_level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.daemon.log_level
            ),
        });
    }

    for (key, value) in [
        ("daemon.shutdown_timeout_secs", config.daemon.shutdown_timeout_secs),
        ("engine.idle_poll_interval_secs", config.engine.idle_poll_interval_secs),
        ("engine.idle_timeout_secs", config.engine.idle_timeout_secs),
        ("fetcher.poll_interval_secs", config.fetcher.poll_interval_secs),
    ] {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be at least 1, got 0"),
            });
        }
    }

    if config.engine.idle_scans_per_cycle == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.idle_scans_per_cycle must be at least 1, got 0".to_string(),
        });
    }

    if config.engine.keywords_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.keywords_limit must be at least 1, got 0".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
