// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! Shared test helpers for queue tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use cl_core::action::{Method, QueuedAction};
use chrono::{TimeZone, Utc};
use serde_json::json;
use tokio::sync::Notify;

use super::executor::{ActionExecutor, ReplayOutcome};

/// A hook invoked with the zero-based call index after each mock call.
pub type CallHook = Box<dyn Fn(usize) + Send + Sync>;

/// Scripted executor recording every call.
///
/// Outcomes are served from a queue (defaulting to `Applied` when empty).
/// An optional gate parks each call until notified, and an optional hook
/// runs after each call, letting tests interleave with a sync pass.
pub struct MockExecutor {
    outcomes: Mutex<VecDeque<ReplayOutcome>>,
    calls: Arc<Mutex<Vec<String>>>,
    tokens: Arc<Mutex<Vec<Option<String>>>>,
    gate: Option<Arc<Notify>>,
    hook: Arc<Mutex<Option<CallHook>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        MockExecutor {
            outcomes: Mutex::new(VecDeque::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
            tokens: Arc::new(Mutex::new(Vec::new())),
            gate: None,
            hook: Arc::new(Mutex::new(None)),
        }
    }

    /// Queue the outcome for the next unscripted call.
    pub fn push_outcome(&self, outcome: ReplayOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Park every call until the returned gate is notified.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    /// Handle for installing a call hook after the executor has been
    /// moved into a queue.
    pub fn hook_handle(&self) -> Arc<Mutex<Option<CallHook>>> {
        Arc::clone(&self.hook)
    }

    /// Handle to the endpoint log.
    pub fn calls_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    /// Handle to the bearer-token log.
    pub fn tokens_handle(&self) -> Arc<Mutex<Vec<Option<String>>>> {
        Arc::clone(&self.tokens)
    }
}

impl ActionExecutor for MockExecutor {
    fn execute<'a>(
        &'a self,
        action: &'a QueuedAction,
        token: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = ReplayOutcome> + Send + 'a>> {
        Box::pin(async move {
            let index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(action.endpoint.clone());
                calls.len() - 1
            };
            self.tokens.lock().unwrap().push(token.map(String::from));

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            let outcome = self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(ReplayOutcome::Applied);

            if let Some(hook) = self.hook.lock().unwrap().as_ref() {
                hook(index);
            }

            outcome
        })
    }
}

/// An action with a fixed timestamp, for deterministic ordering.
pub fn action_at(ms: i64, endpoint: &str) -> QueuedAction {
    QueuedAction {
        id: format!("action-{ms}"),
        method: Method::Post,
        endpoint: endpoint.to_string(),
        body: Some(json!({"at": ms})),
        enqueued_at: Utc.timestamp_millis_opt(ms).single().unwrap(),
        retry_count: 0,
    }
}
