// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the adwatch workspace.

use serde::{Deserialize, Serialize};

/// An end recipient of keyword notifications.
///
/// Subscribers are created on first contact from the presentation layer and
/// never physically deleted by the engine. `subscription_enabled` controls
/// whether keyword matches enter the forward queue; `forwarding_enabled`
/// controls whether the queue is drained into delivery events; `menu_closed`
/// suspends delivery while the management console is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    /// Internal id (storage rowid).
    pub id: i64,
    /// External chat-platform id.
    pub external_id: i64,
    /// Optional display name captured on first contact.
    pub display_name: Option<String>,
    pub subscription_enabled: bool,
    pub forwarding_enabled: bool,
    pub menu_closed: bool,
    /// Normalized keyword list owned by this subscriber.
    pub keywords: Vec<String>,
    /// Number of matched-but-undelivered messages in the forward queue.
    pub queue_len: i64,
    /// RFC-3339 creation timestamp.
    pub created_at: String,
}

/// A message ingested from a group source, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestedMessage {
    pub id: i64,
    pub source_id: i64,
    pub category_id: i64,
    pub text: String,
    /// Link the presentation layer delivers instead of re-sending the text.
    pub url: String,
    /// Dedup hash over (date, category, text).
    pub hash: String,
    pub processed: bool,
    pub created_at: String,
}

/// A message about to be ingested; the dedup hash is computed by the caller.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub source_id: i64,
    pub category_id: i64,
    pub text: String,
    pub url: String,
    pub hash: String,
    pub created_at: String,
}

/// One forward-queue entry in a drain snapshot, FIFO order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedMessage {
    pub message_id: i64,
    pub url: String,
    pub text: String,
}

/// The subscribers a matched message must be queued to, one entry per
/// unprocessed message. Committed as a single transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPlanEntry {
    pub message_id: i64,
    /// Deduplicated: each subscriber appears at most once.
    pub subscriber_ids: Vec<i64>,
}

/// A subscriber eligible for queue draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardTarget {
    pub id: i64,
    pub external_id: i64,
}

/// Counters reported by a [`MessageFetcher`](crate::traits::MessageFetcher) pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Messages seen at the source this pass.
    pub fetched: u64,
    /// Messages newly inserted (not dedup-dropped).
    pub inserted: u64,
}
