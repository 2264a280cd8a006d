// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! Durable offline queue.
//!
//! Guarantees that mutating requests issued while offline (or whose direct
//! attempt failed) are not lost: each is committed to the SQLite-backed
//! [`cl_core::ActionStore`] before the enqueue call returns, and replayed
//! against the server in enqueue order once connectivity is confirmed.
//!
//! # Features
//!
//! - Durable enqueue (committed before the call resolves)
//! - Strict FIFO replay by enqueue time
//! - Bounded per-action retry with eventual discard
//! - 409 Conflict treated as already-applied
//! - Overlapping sync passes collapse to one
//! - Injectable executor trait for testing

mod executor;
mod sync;

pub use executor::{ActionExecutor, HttpExecutor, ReplayOutcome};
pub use sync::{OfflineQueue, MAX_ACTION_RETRIES};

#[cfg(test)]
mod test_helpers;

#[cfg(test)]
mod executor_tests;
