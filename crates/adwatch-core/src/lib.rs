// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the adwatch daemon.
//!
//! Provides the error taxonomy, domain types, and the collaborator traits
//! ([`Repository`], [`MessageFetcher`]) implemented elsewhere in the
//! workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::AdwatchError;
pub use traits::{MessageFetcher, Repository};
pub use types::{
    FetchStats, ForwardTarget, IngestedMessage, MatchPlanEntry, NewMessage, QueuedMessage,
    Subscriber,
};
