// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the adwatch configuration system.

use adwatch_config::diagnostic::ConfigError;
use adwatch_config::{load_and_validate_str, load_config_from_str};

#[test]
fn valid_toml_deserializes_into_adwatch_config() {
    let toml = r#"
[daemon]
log_level = "debug"
shutdown_timeout_secs = 5

[engine]
idle_poll_interval_secs = 2
idle_scans_per_cycle = 15
idle_timeout_secs = 120
keywords_limit = 20

[storage]
database_path = "/tmp/adwatch-test.db"
wal_mode = false

[fetcher]
poll_interval_secs = 60
sources_filter = [1001, 1002]
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.daemon.log_level, "debug");
    assert_eq!(config.daemon.shutdown_timeout_secs, 5);
    assert_eq!(config.engine.idle_poll_interval_secs, 2);
    assert_eq!(config.engine.idle_scans_per_cycle, 15);
    assert_eq!(config.engine.idle_timeout_secs, 120);
    assert_eq!(config.engine.keywords_limit, 20);
    assert_eq!(config.storage.database_path, "/tmp/adwatch-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.fetcher.poll_interval_secs, 60);
    assert_eq!(config.fetcher.sources_filter, vec![1001, 1002]);
}

#[test]
fn empty_toml_uses_all_defaults() {
    let config = load_config_from_str("").expect("empty config is valid");
    assert_eq!(config.daemon.log_level, "info");
    assert_eq!(config.engine.idle_scans_per_cycle, 10);
    assert_eq!(config.storage.database_path, "adwatch.db");
}

#[test]
fn unknown_field_produces_diagnostic_with_suggestion() {
    let toml = r#"
[engine]
idle_timout_secs = 60
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion, .. }
            if key == "idle_timout_secs"
                && suggestion.as_deref() == Some("idle_timeout_secs")
    )));
}

#[test]
fn unknown_field_in_storage_is_rejected() {
    let toml = r#"
[storage]
databse_path = "/tmp/x.db"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::UnknownKey { key, .. } if key == "databse_path")));
}

#[test]
fn wrong_type_produces_invalid_type_diagnostic() {
    let toml = r#"
[engine]
idle_timeout_secs = "soon"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject wrong type");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { .. })));
}

#[test]
fn validation_errors_surface_through_load_and_validate() {
    let toml = r#"
[daemon]
log_level = "chatty"

[engine]
keywords_limit = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("semantic errors expected");
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| matches!(e, ConfigError::Validation { .. })));
}

#[test]
fn valid_config_passes_validation() {
    let toml = r#"
[engine]
idle_timeout_secs = 60
"#;
    let config = load_and_validate_str(toml).expect("valid config");
    assert_eq!(config.engine.idle_timeout_secs, 60);
}
