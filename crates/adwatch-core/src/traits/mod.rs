// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits at the engine boundary.
//!
//! The engine talks to exactly two kinds of collaborators: the persistence
//! layer behind [`Repository`], and ingestion sources behind
//! [`MessageFetcher`]. The presentation layer is decoupled through the event
//! bus instead of a trait here.

pub mod fetcher;
pub mod repository;

pub use fetcher::MessageFetcher;
pub use repository::Repository;
