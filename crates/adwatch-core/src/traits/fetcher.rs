// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingestion collaborator trait.

use async_trait::async_trait;

use crate::error::AdwatchError;
use crate::types::FetchStats;

/// A source that pulls raw messages from group chats and submits them through
/// the engine's `add_message` mutation.
///
/// The daemon invokes [`fetch`](MessageFetcher::fetch) on a fixed interval.
/// Implementations are expected to acknowledge reads at the source once
/// submission succeeded, and to swallow per-message extraction errors rather
/// than aborting a whole pass.
#[async_trait]
pub trait MessageFetcher: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// One ingestion pass over the source.
    async fn fetch(&self) -> Result<FetchStats, AdwatchError>;
}
