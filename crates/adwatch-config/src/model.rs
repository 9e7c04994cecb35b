// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the adwatch daemon.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so unrecognized keys are
//! rejected at startup with actionable diagnostics.

use serde::{Deserialize, Serialize};

/// Top-level adwatch configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdwatchConfig {
    /// Daemon process settings.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Notification engine timing and limits.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Ingestion scheduling settings.
    #[serde(default)]
    pub fetcher: FetcherConfig,
}

/// Daemon process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds granted to in-flight event handlers during shutdown.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_shutdown_timeout_secs() -> u64 {
    10
}

/// Notification engine configuration.
///
/// One engine cycle runs `idle_scans_per_cycle` idle scans (one every
/// `idle_poll_interval_secs`) before the heavier match/forward pass, so idle
/// detection is finer-grained than message processing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Sleep between idle scans, in seconds.
    #[serde(default = "default_idle_poll_interval_secs")]
    pub idle_poll_interval_secs: u64,

    /// Idle scans per cycle before the match/forward pass.
    #[serde(default = "default_idle_scans_per_cycle")]
    pub idle_scans_per_cycle: u32,

    /// Console inactivity threshold before a subscriber counts as idle,
    /// in seconds.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Maximum keywords per subscriber.
    #[serde(default = "default_keywords_limit")]
    pub keywords_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idle_poll_interval_secs: default_idle_poll_interval_secs(),
            idle_scans_per_cycle: default_idle_scans_per_cycle(),
            idle_timeout_secs: default_idle_timeout_secs(),
            keywords_limit: default_keywords_limit(),
        }
    }
}

fn default_idle_poll_interval_secs() -> u64 {
    3
}

fn default_idle_scans_per_cycle() -> u32 {
    10
}

fn default_idle_timeout_secs() -> u64 {
    300
}

fn default_keywords_limit() -> usize {
    10
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "adwatch.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Ingestion scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FetcherConfig {
    /// Seconds between ingestion passes.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Restrict ingestion to these source chat ids. Empty means all sources
    /// the fetcher can see.
    #[serde(default)]
    pub sources_filter: Vec<i64>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            sources_filter: Vec::new(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    30
}
