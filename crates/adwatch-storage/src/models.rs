// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types live in `adwatch-core::types` so they can cross the
//! `Repository` trait boundary. This module re-exports them for convenience
//! within the storage crate.

pub use adwatch_core::types::{
    ForwardTarget, IngestedMessage, MatchPlanEntry, NewMessage, QueuedMessage, Subscriber,
};
