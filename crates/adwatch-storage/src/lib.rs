// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the adwatch daemon.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed query modules for
//! subscribers, keywords, ingested messages, and per-subscriber forward
//! queues. [`SqliteRepository`] implements the engine's `Repository` trait on
//! top of those modules.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteRepository;
pub use database::Database;
pub use models::*;
