// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! Tests for replay outcomes and the mock executor contract.

#![allow(clippy::unwrap_used)]

use super::executor::{ActionExecutor, ReplayOutcome};
use super::test_helpers::{action_at, MockExecutor};

#[test]
fn applied_is_success() {
    assert!(ReplayOutcome::Applied.is_success());
}

#[test]
fn conflict_is_success() {
    assert!(ReplayOutcome::AlreadyApplied.is_success());
}

#[test]
fn rejection_is_not_success() {
    assert!(!ReplayOutcome::Rejected { status: 422 }.is_success());
    assert!(!ReplayOutcome::Rejected { status: 500 }.is_success());
}

#[test]
fn network_failure_is_not_success() {
    assert!(!ReplayOutcome::Failed("timed out".into()).is_success());
}

#[tokio::test]
async fn mock_defaults_to_applied_when_unscripted() {
    let executor = MockExecutor::new();
    let action = action_at(1000, "/a");

    let outcome = executor.execute(&action, None).await;

    assert_eq!(outcome, ReplayOutcome::Applied);
}

#[tokio::test]
async fn mock_serves_scripted_outcomes_in_order() {
    let executor = MockExecutor::new();
    executor.push_outcome(ReplayOutcome::Rejected { status: 500 });
    executor.push_outcome(ReplayOutcome::AlreadyApplied);
    let action = action_at(1000, "/a");

    assert_eq!(
        executor.execute(&action, None).await,
        ReplayOutcome::Rejected { status: 500 }
    );
    assert_eq!(
        executor.execute(&action, None).await,
        ReplayOutcome::AlreadyApplied
    );
    // Script exhausted, back to the default
    assert_eq!(executor.execute(&action, None).await, ReplayOutcome::Applied);
}

#[tokio::test]
async fn mock_records_endpoints_and_tokens() {
    let executor = MockExecutor::new();
    let calls = executor.calls_handle();
    let tokens = executor.tokens_handle();

    executor.execute(&action_at(1000, "/a"), Some("tok-1")).await;
    executor.execute(&action_at(2000, "/b"), None).await;

    assert_eq!(*calls.lock().unwrap(), vec!["/a", "/b"]);
    assert_eq!(
        *tokens.lock().unwrap(),
        vec![Some("tok-1".to_string()), None]
    );
}
