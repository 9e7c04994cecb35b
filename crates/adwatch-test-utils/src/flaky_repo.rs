// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Failure-injecting repository wrapper.
//!
//! Delegates every operation to an inner repository, but can be switched to
//! fail the transactional pass commits. Used to exercise the engine's
//! "phase produced no effect this cycle" recovery contract.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use adwatch_core::types::{
    ForwardTarget, IngestedMessage, MatchPlanEntry, NewMessage, QueuedMessage, Subscriber,
};
use adwatch_core::{AdwatchError, Repository};

/// Wraps a real repository and injects storage errors on demand.
pub struct FlakyRepository {
    inner: Arc<dyn Repository>,
    fail_match_commits: AtomicBool,
    fail_queue_removals: AtomicBool,
}

impl FlakyRepository {
    pub fn new(inner: Arc<dyn Repository>) -> Self {
        Self {
            inner,
            fail_match_commits: AtomicBool::new(false),
            fail_queue_removals: AtomicBool::new(false),
        }
    }

    /// Make `commit_match_plan` fail until switched back.
    pub fn fail_match_commits(&self, fail: bool) {
        self.fail_match_commits.store(fail, Ordering::SeqCst);
    }

    /// Make `remove_queued` fail until switched back.
    pub fn fail_queue_removals(&self, fail: bool) {
        self.fail_queue_removals.store(fail, Ordering::SeqCst);
    }

    fn injected() -> AdwatchError {
        AdwatchError::Storage {
            source: "injected storage failure".into(),
        }
    }
}

#[async_trait]
impl Repository for FlakyRepository {
    async fn initialize(&self) -> Result<(), AdwatchError> {
        self.inner.initialize().await
    }

    async fn close(&self) -> Result<(), AdwatchError> {
        self.inner.close().await
    }

    async fn create_subscriber(
        &self,
        external_id: i64,
        display_name: Option<&str>,
    ) -> Result<Subscriber, AdwatchError> {
        self.inner.create_subscriber(external_id, display_name).await
    }

    async fn subscriber_by_id(&self, id: i64) -> Result<Option<Subscriber>, AdwatchError> {
        self.inner.subscriber_by_id(id).await
    }

    async fn subscriber_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<Subscriber>, AdwatchError> {
        self.inner.subscriber_by_external_id(external_id).await
    }

    async fn set_subscription_enabled(&self, id: i64, enabled: bool) -> Result<(), AdwatchError> {
        self.inner.set_subscription_enabled(id, enabled).await
    }

    async fn set_forwarding_enabled(&self, id: i64, enabled: bool) -> Result<(), AdwatchError> {
        self.inner.set_forwarding_enabled(id, enabled).await
    }

    async fn set_menu_closed(&self, id: i64, closed: bool) -> Result<(), AdwatchError> {
        self.inner.set_menu_closed(id, closed).await
    }

    async fn add_keyword(&self, id: i64, word: &str, limit: usize) -> Result<bool, AdwatchError> {
        self.inner.add_keyword(id, word, limit).await
    }

    async fn remove_keyword(&self, id: i64, word: &str) -> Result<(), AdwatchError> {
        self.inner.remove_keyword(id, word).await
    }

    async fn insert_message(&self, msg: &NewMessage) -> Result<bool, AdwatchError> {
        self.inner.insert_message(msg).await
    }

    async fn unprocessed_messages(&self) -> Result<Vec<IngestedMessage>, AdwatchError> {
        self.inner.unprocessed_messages().await
    }

    async fn active_keyword_index(&self) -> Result<HashMap<String, Vec<i64>>, AdwatchError> {
        self.inner.active_keyword_index().await
    }

    async fn commit_match_plan(&self, plan: &[MatchPlanEntry]) -> Result<(), AdwatchError> {
        if self.fail_match_commits.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.commit_match_plan(plan).await
    }

    async fn forwarding_subscribers(&self) -> Result<Vec<ForwardTarget>, AdwatchError> {
        self.inner.forwarding_subscribers().await
    }

    async fn queued_messages(
        &self,
        subscriber_id: i64,
    ) -> Result<Vec<QueuedMessage>, AdwatchError> {
        self.inner.queued_messages(subscriber_id).await
    }

    async fn remove_queued(
        &self,
        subscriber_id: i64,
        message_ids: &[i64],
    ) -> Result<(), AdwatchError> {
        if self.fail_queue_removals.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.remove_queued(subscriber_id, message_ids).await
    }

    async fn open_menu_subscriber_ids(&self) -> Result<Vec<i64>, AdwatchError> {
        self.inner.open_menu_subscriber_ids().await
    }
}
