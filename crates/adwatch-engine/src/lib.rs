// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The notification engine for the adwatch daemon.
//!
//! The [`NotificationEngine`] is the central coordinator that:
//! - Scans the activity cache and publishes idle events
//! - Runs the keyword-matching pass over unprocessed messages
//! - Drains forward queues into delivery events while consoles are closed
//! - Exposes the subscriber/keyword/message mutation API used by the
//!   presentation layer and the ingestion collaborator
//! - Handles cooperative shutdown with awaitable quiescence

pub mod activity;
pub mod fetch;
pub mod forwarder;
pub mod matcher;
pub mod shutdown;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use adwatch_bus::{Event, EventBus};
use adwatch_config::model::EngineConfig;
use adwatch_core::types::{NewMessage, Subscriber};
use adwatch_core::{AdwatchError, Repository};

pub use activity::ActivityTracker;
pub use forwarder::ForwardQueueManager;
pub use matcher::KeywordMatcher;

/// Consecutive failed phases before a `CriticalError` event is published.
const CRITICAL_FAILURE_THRESHOLD: u32 = 3;

/// Engine lifecycle, observable through [`NotificationEngine::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
    Stopping,
}

/// The notification engine orchestrator.
///
/// Owns the activity cache (single writer: this engine; outside callers go
/// through the synchronized notify accessors) and a cancellable run loop.
/// All other state lives in the store and is re-read every cycle.
pub struct NotificationEngine {
    repo: Arc<dyn Repository>,
    bus: Arc<EventBus>,
    activity: Arc<ActivityTracker>,
    matcher: KeywordMatcher,
    forwarder: ForwardQueueManager,
    config: EngineConfig,
    cancel: CancellationToken,
    state_tx: watch::Sender<EngineState>,
}

impl NotificationEngine {
    pub fn new(repo: Arc<dyn Repository>, bus: Arc<EventBus>, config: EngineConfig) -> Self {
        let activity = Arc::new(ActivityTracker::new());
        let matcher = KeywordMatcher::new(repo.clone());
        let forwarder = ForwardQueueManager::new(repo.clone(), bus.clone(), activity.clone());
        let (state_tx, _) = watch::channel(EngineState::Stopped);

        Self {
            repo,
            bus,
            activity,
            matcher,
            forwarder,
            config,
            cancel: CancellationToken::new(),
            state_tx,
        }
    }

    /// The engine's cancellation token, for wiring to signal handlers.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        *self.state_tx.borrow()
    }

    /// The activity cache. Read access for status queries; writes from
    /// outside the loop go through the notify accessors below.
    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    /// Runs the engine until [`stop`](Self::stop) is called or the
    /// cancellation token fires.
    ///
    /// On exit, normal or exceptional, the engine transitions through
    /// Stopping, publishes `EngineStopped`, and settles to Stopped.
    pub async fn run(&self) -> Result<(), AdwatchError> {
        let result = self.run_inner().await;

        self.state_tx.send_replace(EngineState::Stopping);
        self.bus.publish(Event::EngineStopped).await;
        self.state_tx.send_replace(EngineState::Stopped);

        match &result {
            Ok(()) => info!("notification engine stopped"),
            Err(e) => error!(error = %e, "notification engine exited with error"),
        }
        result
    }

    async fn run_inner(&self) -> Result<(), AdwatchError> {
        // Rebuild the activity cache from the persisted menu flags so the
        // "record exists iff menu open" invariant holds from the first scan.
        let open = self.repo.open_menu_subscriber_ids().await?;
        self.activity.load_open(&open);

        self.state_tx.send_replace(EngineState::Running);
        info!(
            idle_poll_secs = self.config.idle_poll_interval_secs,
            scans_per_cycle = self.config.idle_scans_per_cycle,
            idle_timeout_secs = self.config.idle_timeout_secs,
            "notification engine running"
        );

        let poll = Duration::from_secs(self.config.idle_poll_interval_secs);
        let idle_threshold = Duration::from_secs(self.config.idle_timeout_secs);
        let mut consecutive_failures = 0u32;

        'cycle: loop {
            // Phase 1: idle scans at finer granularity than the match/forward
            // pass. The sleep is interruptible so shutdown latency is bounded
            // by one poll interval.
            for _ in 0..self.config.idle_scans_per_cycle {
                if self.cancel.is_cancelled() {
                    break 'cycle;
                }
                for subscriber_id in self.activity.scan_idle(idle_threshold) {
                    self.bus
                        .publish(Event::SubscriberIdle { subscriber_id })
                        .await;
                }
                tokio::select! {
                    _ = tokio::time::sleep(poll) => {}
                    _ = self.cancel.cancelled() => break 'cycle,
                }
            }

            if self.cancel.is_cancelled() {
                break;
            }

            // Phase 2: matching. A transient failure must not starve the
            // drain of already-queued items, so the cycle continues.
            let changed = match self.matcher.process_unprocessed().await {
                Ok(changed) => {
                    consecutive_failures = 0;
                    changed
                }
                Err(e) => {
                    warn!(error = %e, "matching pass failed, retrying next cycle");
                    consecutive_failures += 1;
                    HashSet::new()
                }
            };

            if self.cancel.is_cancelled() {
                break;
            }

            // Phase 3: drain, same failure policy.
            if let Err(e) = self.forwarder.drain().await {
                warn!(error = %e, "drain pass failed, retrying next cycle");
                consecutive_failures += 1;
            }

            if consecutive_failures >= CRITICAL_FAILURE_THRESHOLD {
                self.bus
                    .publish(Event::CriticalError {
                        message: format!(
                            "storage failing across {consecutive_failures} consecutive engine phases"
                        ),
                    })
                    .await;
                consecutive_failures = 0;
            }

            // Phase 4: one refresh per subscriber whose queue changed while
            // their console is open, batched per cycle.
            for subscriber_id in changed {
                if self.activity.is_menu_open(subscriber_id) {
                    self.bus
                        .publish(Event::SubscriberDataUpdated { subscriber_id })
                        .await;
                }
            }
        }

        Ok(())
    }

    /// Requests a stop and waits until the run loop has fully exited.
    ///
    /// Callers can tear down dependents (bus, store) once this returns.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let mut rx = self.state_tx.subscribe();
        while *rx.borrow_and_update() != EngineState::Stopped {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    // --- Mutation API (presentation layer and ingestion collaborator) ---

    /// Fetch the subscriber with this external id, creating them on first
    /// contact.
    pub async fn get_or_create_subscriber(
        &self,
        external_id: i64,
        display_name: Option<&str>,
    ) -> Result<Subscriber, AdwatchError> {
        if let Some(subscriber) = self.repo.subscriber_by_external_id(external_id).await? {
            return Ok(subscriber);
        }
        let subscriber = self.repo.create_subscriber(external_id, display_name).await?;
        info!(
            subscriber_id = subscriber.id,
            external_id, "subscriber created on first contact"
        );
        Ok(subscriber)
    }

    /// Read accessor for the presentation layer; keyword list and queue
    /// length included.
    pub async fn subscriber(&self, id: i64) -> Result<Subscriber, AdwatchError> {
        self.repo
            .subscriber_by_id(id)
            .await?
            .ok_or(AdwatchError::SubscriberNotFound { subscriber_id: id })
    }

    /// Like [`subscriber`](Self::subscriber), looked up by external platform
    /// id. `None` means no contact yet, not an error.
    pub async fn subscriber_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<Subscriber>, AdwatchError> {
        self.repo.subscriber_by_external_id(external_id).await
    }

    pub async fn set_subscription_enabled(
        &self,
        id: i64,
        enabled: bool,
    ) -> Result<(), AdwatchError> {
        self.repo.set_subscription_enabled(id, enabled).await?;
        debug!(subscriber_id = id, enabled, "subscription flag updated");
        Ok(())
    }

    pub async fn set_forwarding_enabled(
        &self,
        id: i64,
        enabled: bool,
    ) -> Result<(), AdwatchError> {
        self.repo.set_forwarding_enabled(id, enabled).await?;
        debug!(subscriber_id = id, enabled, "forwarding flag updated");
        Ok(())
    }

    /// Persist the menu flag and keep the activity cache in lockstep.
    pub async fn set_menu_closed(&self, id: i64, closed: bool) -> Result<(), AdwatchError> {
        self.repo.set_menu_closed(id, closed).await?;
        if closed {
            self.activity.mark_menu_closed(id);
        } else {
            self.activity.mark_menu_opened(id);
        }
        Ok(())
    }

    /// Add a keyword to the subscriber's list.
    ///
    /// The word is normalized (trimmed, lower-cased). Returns whether the
    /// list actually changed; an already-present word, a word that is empty
    /// after normalization, or a full list are silent non-effects.
    pub async fn add_keyword(&self, id: i64, word: &str) -> Result<bool, AdwatchError> {
        let normalized = normalize_keyword(word);
        if normalized.is_empty() {
            debug!(subscriber_id = id, "empty keyword after normalization, ignored");
            return Ok(false);
        }
        self.repo
            .add_keyword(id, &normalized, self.config.keywords_limit)
            .await
    }

    /// Remove a keyword from the subscriber's list. Messages that matched it
    /// and are already queued stay queued.
    pub async fn remove_keyword(&self, id: i64, word: &str) -> Result<(), AdwatchError> {
        let normalized = normalize_keyword(word);
        if normalized.is_empty() {
            return Ok(());
        }
        self.repo.remove_keyword(id, &normalized).await
    }

    /// Ingest one raw message.
    ///
    /// The dedup hash covers (current UTC date, category, text), so a
    /// re-submission the same day is dropped. Returns whether a new row was
    /// inserted.
    pub async fn add_message(
        &self,
        category_id: i64,
        source_id: i64,
        text: &str,
        url: &str,
    ) -> Result<bool, AdwatchError> {
        let now = chrono::Utc::now();
        let msg = NewMessage {
            source_id,
            category_id,
            text: text.to_string(),
            url: url.to_string(),
            hash: dedup_hash(&now.format("%Y-%m-%d").to_string(), category_id, text),
            created_at: now.to_rfc3339(),
        };
        let inserted = self.repo.insert_message(&msg).await?;
        if inserted {
            debug!(source_id, category_id, "message ingested");
        } else {
            debug!(source_id, category_id, "duplicate message dropped");
        }
        Ok(inserted)
    }

    // --- ActivityTracker writers for the presentation collaborator ---

    pub fn notify_menu_opened(&self, id: i64) {
        self.activity.mark_menu_opened(id);
    }

    pub fn notify_menu_closed(&self, id: i64) {
        self.activity.mark_menu_closed(id);
    }

    pub fn notify_activity(&self, id: i64) {
        self.activity.touch(id);
    }

    // --- Direct access to the per-cycle passes (also used by tests) ---

    /// The keyword-matching pass of one cycle. Returns the subscribers whose
    /// queues changed.
    pub async fn process_unprocessed(&self) -> Result<HashSet<i64>, AdwatchError> {
        self.matcher.process_unprocessed().await
    }

    /// The queue-drain pass of one cycle.
    pub async fn drain(&self) -> Result<(), AdwatchError> {
        self.forwarder.drain().await
    }
}

/// Keywords are stored trimmed and lower-cased; matching assumes it.
fn normalize_keyword(word: &str) -> String {
    word.trim().to_lowercase()
}

/// Hex SHA-256 over `date | category | text`.
fn dedup_hash(date: &str, category_id: i64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(date.as_bytes());
    hasher.update(b"|");
    hasher.update(category_id.to_le_bytes());
    hasher.update(b"|");
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
