// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! Capped exponential backoff for reconnection scheduling.
//!
//! The delay before attempt k is `min(initial * 2^(k-1), cap)`. The policy
//! is a pure value; the attempt counter lives with the connection so that a
//! successful open resets it.

use std::time::Duration;

/// Default initial reconnect delay.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Default delay ceiling.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Capped exponential backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    cap: Duration,
}

impl Backoff {
    /// Creates a policy with the given initial delay and ceiling.
    pub fn new(initial: Duration, cap: Duration) -> Self {
        Backoff { initial, cap }
    }

    /// Returns the delay to wait before the given attempt (1-based).
    ///
    /// Attempt 0 is treated as attempt 1.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial.saturating_mul(1 << exponent).min(self.cap)
    }

    /// The initial delay.
    pub fn initial(&self) -> Duration {
        self.initial
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::new(DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY)
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
