// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules over the single-writer [`Database`](crate::Database).

pub mod keywords;
pub mod messages;
pub mod queue;
pub mod subscribers;
