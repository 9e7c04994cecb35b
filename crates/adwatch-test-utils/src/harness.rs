// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete engine stack: temp SQLite repository,
//! event bus with a recording handler subscribed to every event type, and a
//! [`NotificationEngine`]. The failure-injecting repository wrapper sits
//! between the engine and SQLite so tests can simulate storage outages.

use std::sync::Arc;

use adwatch_bus::{EventBus, EventType};
use adwatch_config::model::{EngineConfig, StorageConfig};
use adwatch_core::{AdwatchError, Repository};
use adwatch_engine::NotificationEngine;
use adwatch_storage::SqliteRepository;

use crate::flaky_repo::FlakyRepository;
use crate::recorder::RecordingHandler;

const ALL_EVENT_TYPES: &[EventType] = &[
    EventType::SubscriberDataUpdated,
    EventType::SubscriberIdle,
    EventType::DeliveryRequested,
    EventType::CriticalError,
    EventType::EngineStopped,
];

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    engine_config: EngineConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            engine_config: EngineConfig::default(),
        }
    }

    /// Override the engine configuration (intervals, keyword cap).
    pub fn with_engine_config(mut self, config: EngineConfig) -> Self {
        self.engine_config = config;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, AdwatchError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| AdwatchError::Storage {
            source: e.into(),
        })?;
        let db_path = temp_dir.path().join("test.db");

        let sqlite = SqliteRepository::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        });
        sqlite.initialize().await?;

        let repo = Arc::new(FlakyRepository::new(Arc::new(sqlite)));
        let bus = Arc::new(EventBus::new());
        let recorder = RecordingHandler::new("test-recorder");
        bus.subscribe(ALL_EVENT_TYPES, recorder.clone()).await?;

        let engine = Arc::new(NotificationEngine::new(
            repo.clone() as Arc<dyn Repository>,
            bus.clone(),
            self.engine_config,
        ));

        Ok(TestHarness {
            repo,
            bus,
            engine,
            recorder,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with temp storage and a recording handler.
pub struct TestHarness {
    /// The failure-injecting repository in front of temp SQLite.
    pub repo: Arc<FlakyRepository>,
    /// The event bus the engine publishes into.
    pub bus: Arc<EventBus>,
    /// The engine under test.
    pub engine: Arc<NotificationEngine>,
    /// Recording handler subscribed to every event type.
    pub recorder: Arc<RecordingHandler>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Wait for all in-flight handler invocations so recorded events are
    /// complete before assertions.
    pub async fn settle(&self) {
        self.bus
            .drain_pending(std::time::Duration::from_secs(2))
            .await
            .expect("bus drain in test harness");
    }
}
