// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The keyword-matching pass.
//!
//! Matching is case-insensitive substring search with no word-boundary
//! requirement: keyword `"bike"` matches `"mountainbike for sale"`. The
//! active index is recomputed from the store on every pass; with small
//! subscriber and keyword counts, freshness is worth more than caching.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use adwatch_core::types::MatchPlanEntry;
use adwatch_core::{AdwatchError, Repository};

/// Computes subscriber matches for unprocessed messages and commits them.
pub struct KeywordMatcher {
    repo: Arc<dyn Repository>,
}

impl KeywordMatcher {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Fresh keyword -> subscriber-ids snapshot, restricted to subscribers
    /// with subscription enabled.
    pub async fn compute_active_index(
        &self,
    ) -> Result<HashMap<String, Vec<i64>>, AdwatchError> {
        self.repo.active_keyword_index().await
    }

    /// One matching pass over every message with `processed == false`.
    ///
    /// The whole pass commits as a single store transaction: each message is
    /// queued to every matched subscriber exactly once and flagged processed,
    /// or, on a storage failure, none of it happened and the next pass
    /// retries from scratch.
    ///
    /// Returns the ids of subscribers whose queues gained entries.
    pub async fn process_unprocessed(&self) -> Result<HashSet<i64>, AdwatchError> {
        let pending = self.repo.unprocessed_messages().await?;
        if pending.is_empty() {
            return Ok(HashSet::new());
        }
        let index = self.compute_active_index().await?;

        let mut plan = Vec::with_capacity(pending.len());
        let mut changed = HashSet::new();
        for msg in &pending {
            let matched = match_subscribers(&msg.text, &index);
            changed.extend(matched.iter().copied());
            plan.push(MatchPlanEntry {
                message_id: msg.id,
                subscriber_ids: matched,
            });
        }

        self.repo.commit_match_plan(&plan).await?;
        debug!(
            messages = pending.len(),
            subscribers = changed.len(),
            "matching pass committed"
        );
        Ok(changed)
    }
}

/// All subscribers whose keywords occur in `text`, each at most once even
/// when several of their keywords match. Keywords in the index are already
/// normalized (trimmed, lower-cased).
pub(crate) fn match_subscribers(text: &str, index: &HashMap<String, Vec<i64>>) -> Vec<i64> {
    let haystack = text.to_lowercase();
    let mut matched = BTreeSet::new();
    for (word, subscriber_ids) in index {
        if haystack.contains(word.as_str()) {
            matched.extend(subscriber_ids.iter().copied());
        }
    }
    matched.into_iter().collect()
}
