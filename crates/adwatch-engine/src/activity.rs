// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory menu-activity cache.
//!
//! A record exists exactly while the subscriber's console is open; its
//! timestamp is refreshed on every activity ping. This cache, not the store,
//! is authoritative for idle-timeout decisions. It is rebuilt from persisted
//! `menu_closed` flags once at engine startup and owned by the engine
//! afterwards; the presentation layer writes only through the engine's
//! synchronized notify accessors.
//!
//! Timestamps use `tokio::time::Instant` so tests can drive idleness with a
//! paused clock.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

/// Tracks `last_activity_at` per subscriber with an open console.
#[derive(Default)]
pub struct ActivityTracker {
    records: Mutex<HashMap<i64, Instant>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock only means some holder panicked mid-read; the map
    // itself stays consistent, so keep serving it.
    fn records(&self) -> MutexGuard<'_, HashMap<i64, Instant>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed records for consoles already open per the persisted flags.
    /// Called once at engine startup.
    pub fn load_open(&self, subscriber_ids: &[i64]) {
        let now = Instant::now();
        let mut records = self.records();
        for &id in subscriber_ids {
            records.insert(id, now);
        }
        if !subscriber_ids.is_empty() {
            debug!(count = subscriber_ids.len(), "activity cache rebuilt from store");
        }
    }

    /// Insert or overwrite the record with `last_activity_at = now`.
    pub fn mark_menu_opened(&self, subscriber_id: i64) {
        self.records().insert(subscriber_id, Instant::now());
    }

    /// Remove the record. Idempotent.
    pub fn mark_menu_closed(&self, subscriber_id: i64) {
        self.records().remove(&subscriber_id);
    }

    /// Refresh `last_activity_at` for an existing record.
    ///
    /// Activity without an open console violates the caller's invariant; the
    /// record is created defensively so the idle scan still sees the console.
    pub fn touch(&self, subscriber_id: i64) {
        let mut records = self.records();
        if records.insert(subscriber_id, Instant::now()).is_none() {
            warn!(
                subscriber_id,
                "activity ping for a console not marked open, record created"
            );
        }
    }

    /// Whether the subscriber's console is currently open.
    pub fn is_menu_open(&self, subscriber_id: i64) -> bool {
        self.records().contains_key(&subscriber_id)
    }

    /// True iff a record exists and has been inactive for at least
    /// `threshold`. Unknown subscribers are simply not idle.
    pub fn is_idle(&self, subscriber_id: i64, threshold: Duration) -> bool {
        self.records()
            .get(&subscriber_id)
            .is_some_and(|last| last.elapsed() >= threshold)
    }

    /// Snapshot of all currently-idle subscriber ids, ascending.
    pub fn scan_idle(&self, threshold: Duration) -> Vec<i64> {
        let mut idle: Vec<i64> = self
            .records()
            .iter()
            .filter(|(_, last)| last.elapsed() >= threshold)
            .map(|(&id, _)| id)
            .collect();
        idle.sort_unstable();
        idle
    }

    /// Snapshot of all subscribers with an open console, ascending.
    pub fn open_subscribers(&self) -> Vec<i64> {
        let mut open: Vec<i64> = self.records().keys().copied().collect();
        open.sort_unstable();
        open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn fresh_record_is_not_idle() {
        let tracker = ActivityTracker::new();
        tracker.mark_menu_opened(1);
        assert!(!tracker.is_idle(1, T));
    }

    #[tokio::test(start_paused = true)]
    async fn record_becomes_idle_after_threshold() {
        let tracker = ActivityTracker::new();
        tracker.mark_menu_opened(1);
        tokio::time::advance(T).await;
        assert!(tracker.is_idle(1, T));
        assert_eq!(tracker.scan_idle(T), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn touch_resets_the_idle_clock() {
        let tracker = ActivityTracker::new();
        tracker.mark_menu_opened(1);
        tokio::time::advance(T * 2).await;
        assert!(tracker.is_idle(1, T));

        tracker.touch(1);
        assert!(!tracker.is_idle(1, T));
        assert!(tracker.scan_idle(T).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reopening_resets_the_idle_clock() {
        let tracker = ActivityTracker::new();
        tracker.mark_menu_opened(1);
        tokio::time::advance(T * 2).await;
        tracker.mark_menu_opened(1);
        assert!(!tracker.is_idle(1, T));
    }

    #[tokio::test(start_paused = true)]
    async fn closed_menu_is_never_idle() {
        let tracker = ActivityTracker::new();
        tracker.mark_menu_opened(1);
        tokio::time::advance(T * 2).await;
        tracker.mark_menu_closed(1);
        assert!(!tracker.is_idle(1, T));
        // Closing again is an idempotent no-op.
        tracker.mark_menu_closed(1);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_subscriber_is_not_idle() {
        let tracker = ActivityTracker::new();
        assert!(!tracker.is_idle(99, T));
        assert!(!tracker.is_menu_open(99));
    }

    #[tokio::test(start_paused = true)]
    async fn touch_without_open_menu_creates_record_defensively() {
        let tracker = ActivityTracker::new();
        tracker.touch(5);
        assert!(tracker.is_menu_open(5));
    }

    #[tokio::test(start_paused = true)]
    async fn scan_idle_reports_only_idle_subscribers() {
        let tracker = ActivityTracker::new();
        tracker.mark_menu_opened(1);
        tracker.mark_menu_opened(2);
        tokio::time::advance(T).await;
        tracker.mark_menu_opened(3);

        assert_eq!(tracker.scan_idle(T), vec![1, 2]);
        assert_eq!(tracker.open_subscribers(), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn load_open_seeds_records_as_fresh() {
        let tracker = ActivityTracker::new();
        tracker.load_open(&[7, 8]);
        assert!(tracker.is_menu_open(7));
        assert!(tracker.is_menu_open(8));
        assert!(!tracker.is_idle(7, T));
    }
}
