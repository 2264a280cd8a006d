// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    first = { 1, 1 },
    second = { 2, 2 },
    third = { 3, 4 },
    fourth = { 4, 8 },
    fifth = { 5, 16 },
    capped = { 6, 30 },
    deep = { 10, 30 },
)]
fn delay_doubles_until_cap(attempt: u32, expected_secs: u64) {
    let backoff = Backoff::default();
    assert_eq!(
        backoff.delay_for(attempt),
        Duration::from_secs(expected_secs)
    );
}

#[test]
fn attempt_zero_equals_attempt_one() {
    let backoff = Backoff::default();
    assert_eq!(backoff.delay_for(0), backoff.delay_for(1));
}

#[test]
fn huge_attempt_does_not_overflow() {
    let backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(30));
    assert_eq!(backoff.delay_for(u32::MAX), Duration::from_secs(30));
}

#[test]
fn custom_initial_and_cap() {
    let backoff = Backoff::new(Duration::from_millis(50), Duration::from_millis(200));
    assert_eq!(backoff.delay_for(1), Duration::from_millis(50));
    assert_eq!(backoff.delay_for(2), Duration::from_millis(100));
    assert_eq!(backoff.delay_for(3), Duration::from_millis(200));
    assert_eq!(backoff.delay_for(4), Duration::from_millis(200));
}
