// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for adwatch integration tests.
//!
//! Provides fast, deterministic, CI-runnable building blocks without
//! external services:
//!
//! - [`RecordingHandler`] - bus handler capturing events for assertion
//! - [`FlakyRepository`] - failure-injecting repository wrapper
//! - [`TestHarness`] - full engine stack over a temp SQLite database

pub mod flaky_repo;
pub mod harness;
pub mod recorder;

pub use flaky_repo::FlakyRepository;
pub use harness::TestHarness;
pub use recorder::RecordingHandler;
