// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./adwatch.toml` > `~/.config/adwatch/adwatch.toml`
//! > `/etc/adwatch/adwatch.toml`, with environment variable overrides via the
//! `ADWATCH_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AdwatchConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/adwatch/adwatch.toml` (system-wide)
/// 3. `~/.config/adwatch/adwatch.toml` (user XDG config)
/// 4. `./adwatch.toml` (local directory)
/// 5. `ADWATCH_*` environment variables
pub fn load_config() -> Result<AdwatchConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<AdwatchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AdwatchConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AdwatchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AdwatchConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AdwatchConfig::default()))
        .merge(Toml::file("/etc/adwatch/adwatch.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("adwatch/adwatch.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("adwatch.toml"))
        .merge(env_provider())
}

/// Environment variable provider using explicit `map()` for section-to-dot
/// mapping. Uses `Env::map()` rather than `Env::split("_")` so keys that
/// themselves contain underscores map correctly: `ADWATCH_STORAGE_DATABASE_PATH`
/// must become `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("ADWATCH_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name to a dotted config path.
/// `engine_idle_timeout_secs` -> `engine.idle_timeout_secs`.
fn map_env_key(key: &str) -> String {
    key.replacen("daemon_", "daemon.", 1)
        .replacen("engine_", "engine.", 1)
        .replacen("storage_", "storage.", 1)
        .replacen("fetcher_", "fetcher.", 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_string_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[storage]
database_path = "/var/lib/adwatch/adwatch.db"
"#,
        )
        .unwrap();
        assert_eq!(config.storage.database_path, "/var/lib/adwatch/adwatch.db");
        // Untouched sections keep their defaults.
        assert_eq!(config.engine.keywords_limit, 10);
    }

    #[test]
    fn env_key_mapping_splits_on_section_only() {
        assert_eq!(
            map_env_key("engine_idle_timeout_secs"),
            "engine.idle_timeout_secs"
        );
        assert_eq!(
            map_env_key("storage_database_path"),
            "storage.database_path"
        );
        assert_eq!(map_env_key("daemon_log_level"), "daemon.log_level");
        assert_eq!(
            map_env_key("fetcher_poll_interval_secs"),
            "fetcher.poll_interval_secs"
        );
    }
}
