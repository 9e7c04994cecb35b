// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the `Repository` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use adwatch_config::model::StorageConfig;
use adwatch_core::types::{
    ForwardTarget, IngestedMessage, MatchPlanEntry, NewMessage, QueuedMessage, Subscriber,
};
use adwatch_core::{AdwatchError, Repository};

use crate::database::Database;
use crate::queries;

/// SQLite-backed repository.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily opened on the first call to
/// [`Repository::initialize`].
pub struct SqliteRepository {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteRepository {
    /// Create a new repository with the given configuration.
    ///
    /// The database connection is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, AdwatchError> {
        self.db.get().ok_or_else(|| AdwatchError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn initialize(&self) -> Result<(), AdwatchError> {
        let db =
            Database::open_with_options(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| AdwatchError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite repository initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), AdwatchError> {
        // Checkpoint without consuming; the writer thread stops on drop.
        self.db()?.checkpoint().await
    }

    async fn create_subscriber(
        &self,
        external_id: i64,
        display_name: Option<&str>,
    ) -> Result<Subscriber, AdwatchError> {
        queries::subscribers::create_subscriber(self.db()?, external_id, display_name).await
    }

    async fn subscriber_by_id(&self, id: i64) -> Result<Option<Subscriber>, AdwatchError> {
        queries::subscribers::subscriber_by_id(self.db()?, id).await
    }

    async fn subscriber_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<Subscriber>, AdwatchError> {
        queries::subscribers::subscriber_by_external_id(self.db()?, external_id).await
    }

    async fn set_subscription_enabled(&self, id: i64, enabled: bool) -> Result<(), AdwatchError> {
        queries::subscribers::set_subscription_enabled(self.db()?, id, enabled).await
    }

    async fn set_forwarding_enabled(&self, id: i64, enabled: bool) -> Result<(), AdwatchError> {
        queries::subscribers::set_forwarding_enabled(self.db()?, id, enabled).await
    }

    async fn set_menu_closed(&self, id: i64, closed: bool) -> Result<(), AdwatchError> {
        queries::subscribers::set_menu_closed(self.db()?, id, closed).await
    }

    async fn add_keyword(&self, id: i64, word: &str, limit: usize) -> Result<bool, AdwatchError> {
        queries::keywords::add_keyword(self.db()?, id, word, limit).await
    }

    async fn remove_keyword(&self, id: i64, word: &str) -> Result<(), AdwatchError> {
        queries::keywords::remove_keyword(self.db()?, id, word).await
    }

    async fn insert_message(&self, msg: &NewMessage) -> Result<bool, AdwatchError> {
        queries::messages::insert_message(self.db()?, msg).await
    }

    async fn unprocessed_messages(&self) -> Result<Vec<IngestedMessage>, AdwatchError> {
        queries::messages::unprocessed_messages(self.db()?).await
    }

    async fn active_keyword_index(&self) -> Result<HashMap<String, Vec<i64>>, AdwatchError> {
        queries::keywords::active_keyword_index(self.db()?).await
    }

    async fn commit_match_plan(&self, plan: &[MatchPlanEntry]) -> Result<(), AdwatchError> {
        queries::queue::commit_match_plan(self.db()?, plan).await
    }

    async fn forwarding_subscribers(&self) -> Result<Vec<ForwardTarget>, AdwatchError> {
        queries::queue::forwarding_targets(self.db()?).await
    }

    async fn queued_messages(
        &self,
        subscriber_id: i64,
    ) -> Result<Vec<QueuedMessage>, AdwatchError> {
        queries::queue::queued_messages(self.db()?, subscriber_id).await
    }

    async fn remove_queued(
        &self,
        subscriber_id: i64,
        message_ids: &[i64],
    ) -> Result<(), AdwatchError> {
        queries::queue::remove_queued(self.db()?, subscriber_id, message_ids).await
    }

    async fn open_menu_subscriber_ids(&self) -> Result<Vec<i64>, AdwatchError> {
        queries::subscribers::open_menu_subscriber_ids(self.db()?).await
    }
}
