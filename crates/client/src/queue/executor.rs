// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! Replay execution against the server.
//!
//! The sync engine only sees a [`ReplayOutcome`]; how the request is made
//! (and mocked in tests) lives behind the [`ActionExecutor`] trait.

use std::future::Future;
use std::pin::Pin;

use cl_core::action::{Method, QueuedAction};

/// Result of replaying one queued action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// The server accepted the request (2xx).
    Applied,
    /// The server reported a conflict (409): the mutation was already
    /// applied, so the record can be dropped just like a success.
    AlreadyApplied,
    /// The server rejected the request with some other status.
    Rejected {
        /// HTTP status code.
        status: u16,
    },
    /// The request never got a response (network failure).
    Failed(String),
}

impl ReplayOutcome {
    /// Returns true when the queued record may be removed.
    pub fn is_success(&self) -> bool {
        matches!(self, ReplayOutcome::Applied | ReplayOutcome::AlreadyApplied)
    }
}

/// Executes queued actions against the server.
pub trait ActionExecutor: Send + Sync {
    /// Replays one action, attaching the bearer credential when available.
    fn execute<'a>(
        &'a self,
        action: &'a QueuedAction,
        token: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = ReplayOutcome> + Send + 'a>>;
}

/// HTTP executor backed by reqwest.
pub struct HttpExecutor {
    client: reqwest::Client,
}

impl HttpExecutor {
    /// Creates an executor with a default client.
    pub fn new() -> Self {
        HttpExecutor {
            client: reqwest::Client::new(),
        }
    }

    /// Creates an executor around an existing client (shared pools,
    /// custom timeouts).
    pub fn with_client(client: reqwest::Client) -> Self {
        HttpExecutor { client }
    }
}

impl Default for HttpExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionExecutor for HttpExecutor {
    fn execute<'a>(
        &'a self,
        action: &'a QueuedAction,
        token: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = ReplayOutcome> + Send + 'a>> {
        Box::pin(async move {
            let mut request = match action.method {
                Method::Post => self.client.post(&action.endpoint),
                Method::Put => self.client.put(&action.endpoint),
                Method::Patch => self.client.patch(&action.endpoint),
                Method::Delete => self.client.delete(&action.endpoint),
            };

            if let Some(token) = token {
                request = request.bearer_auth(token);
            }

            // DELETE carries no body by construction
            if let Some(body) = &action.body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        ReplayOutcome::Applied
                    } else if status.as_u16() == 409 {
                        ReplayOutcome::AlreadyApplied
                    } else {
                        ReplayOutcome::Rejected {
                            status: status.as_u16(),
                        }
                    }
                }
                Err(e) => ReplayOutcome::Failed(e.to_string()),
            }
        })
    }
}
