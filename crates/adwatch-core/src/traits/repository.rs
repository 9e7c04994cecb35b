// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence abstraction consumed by the notification engine.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::AdwatchError;
use crate::types::{
    ForwardTarget, IngestedMessage, MatchPlanEntry, NewMessage, QueuedMessage, Subscriber,
};

/// The store is the single source of truth for subscribers, keywords,
/// messages, and forward queues. The engine never caches any of it across
/// cycles beyond the per-pass keyword index snapshot.
///
/// Every operation that must be atomic (`add_keyword`, `commit_match_plan`,
/// `remove_queued`) runs as one transaction inside the implementation.
/// Failures surface as [`AdwatchError::Storage`] and are retried naturally by
/// the engine on the next cycle; [`AdwatchError::SubscriberNotFound`] is
/// reserved for mutations naming an id that does not exist.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Opens the backend and applies pending migrations.
    async fn initialize(&self) -> Result<(), AdwatchError>;

    /// Flushes pending writes and releases the backend.
    async fn close(&self) -> Result<(), AdwatchError>;

    // --- Subscribers ---

    async fn create_subscriber(
        &self,
        external_id: i64,
        display_name: Option<&str>,
    ) -> Result<Subscriber, AdwatchError>;

    async fn subscriber_by_id(&self, id: i64) -> Result<Option<Subscriber>, AdwatchError>;

    async fn subscriber_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<Subscriber>, AdwatchError>;

    async fn set_subscription_enabled(&self, id: i64, enabled: bool) -> Result<(), AdwatchError>;

    async fn set_forwarding_enabled(&self, id: i64, enabled: bool) -> Result<(), AdwatchError>;

    async fn set_menu_closed(&self, id: i64, closed: bool) -> Result<(), AdwatchError>;

    // --- Keywords ---

    /// Links `word` to the subscriber, creating the global keyword lazily.
    ///
    /// Returns `false` without error when the word is already linked or the
    /// per-subscriber `limit` is reached (a non-effect, not a failure).
    async fn add_keyword(&self, id: i64, word: &str, limit: usize) -> Result<bool, AdwatchError>;

    /// Unlinks `word` if present; the orphaned keyword row is left behind.
    async fn remove_keyword(&self, id: i64, word: &str) -> Result<(), AdwatchError>;

    // --- Messages ---

    /// Inserts a message unless its dedup hash already exists.
    /// Returns whether a new row was inserted.
    async fn insert_message(&self, msg: &NewMessage) -> Result<bool, AdwatchError>;

    /// All messages with `processed == false`, oldest first.
    async fn unprocessed_messages(&self) -> Result<Vec<IngestedMessage>, AdwatchError>;

    // --- Matching pass ---

    /// Keyword word -> subscriber ids, restricted to subscribers with
    /// `subscription_enabled == true`. Recomputed per pass; never cached here.
    async fn active_keyword_index(&self) -> Result<HashMap<String, Vec<i64>>, AdwatchError>;

    /// Commits a whole matching pass in one transaction: every queue
    /// insertion plus `processed = true` for every planned message. A failure
    /// rolls back the entire pass.
    async fn commit_match_plan(&self, plan: &[MatchPlanEntry]) -> Result<(), AdwatchError>;

    // --- Forward queues ---

    /// Subscribers with `forwarding_enabled == true`.
    async fn forwarding_subscribers(&self) -> Result<Vec<ForwardTarget>, AdwatchError>;

    /// FIFO snapshot of a subscriber's queue (enqueue order preserved).
    async fn queued_messages(&self, subscriber_id: i64)
        -> Result<Vec<QueuedMessage>, AdwatchError>;

    /// Removes delivered entries in one transaction.
    async fn remove_queued(
        &self,
        subscriber_id: i64,
        message_ids: &[i64],
    ) -> Result<(), AdwatchError>;

    // --- Activity reconstruction ---

    /// Ids of subscribers whose persisted `menu_closed == false`; used once
    /// at engine startup to rebuild the in-memory activity cache.
    async fn open_menu_subscriber_ids(&self) -> Result<Vec<i64>, AdwatchError>;
}
