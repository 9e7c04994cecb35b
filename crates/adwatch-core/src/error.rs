// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the adwatch daemon.

use thiserror::Error;

/// The primary error type used across adwatch crates.
///
/// The variants form a closed taxonomy: transient storage failures are
/// retried naturally by the engine loop, not-found errors are caller
/// contract violations propagated to the mutation API caller, and bus
/// configuration errors fail fast at wiring time.
#[derive(Debug, Error)]
pub enum AdwatchError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Transient storage errors (connection, query failure, rolled-back
    /// transaction). The engine treats a phase that returns this as having
    /// produced no effect this cycle.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A mutation named a subscriber id that does not exist.
    #[error("subscriber not found: {subscriber_id}")]
    SubscriberNotFound { subscriber_id: i64 },

    /// Event bus wiring errors (duplicate handler, empty event type set).
    #[error("event bus error: {0}")]
    Bus(String),

    /// A bounded wait (e.g. bus drain at shutdown) expired.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AdwatchError {
    /// True for failures the engine loop absorbs and retries next cycle.
    pub fn is_transient(&self) -> bool {
        matches!(self, AdwatchError::Storage { .. } | AdwatchError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_are_transient() {
        let err = AdwatchError::Storage {
            source: Box::new(std::io::Error::other("disk gone")),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn not_found_is_not_transient() {
        let err = AdwatchError::SubscriberNotFound { subscriber_id: 7 };
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "subscriber not found: 7");
    }

    #[test]
    fn bus_and_config_are_not_transient() {
        assert!(!AdwatchError::Bus("duplicate handler".into()).is_transient());
        assert!(!AdwatchError::Config("bad value".into()).is_transient());
    }
}
