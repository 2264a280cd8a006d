// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! Queued mutations awaiting replay.
//!
//! A [`QueuedAction`] captures one state-changing HTTP request that could not
//! be made immediately. Actions are persisted from the moment of enqueue
//! until they are replayed successfully or discarded after exhausting
//! retries, and are always replayed in ascending `enqueued_at` order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// HTTP method of a queued mutation.
///
/// Read-only methods are deliberately absent: there is no point replaying
/// a GET after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Returns the wire representation of this method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(Error::InvalidMethod(other.to_string())),
        }
    }
}

/// One pending mutation, persisted until replayed or discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    /// Globally unique identifier, assigned at enqueue time.
    pub id: String,
    /// HTTP method to replay with.
    pub method: Method,
    /// Target URL or path.
    pub endpoint: String,
    /// Optional JSON payload (never present for DELETE).
    pub body: Option<Value>,
    /// Enqueue time; the durable replay-ordering key.
    pub enqueued_at: DateTime<Utc>,
    /// Number of failed replay attempts so far.
    pub retry_count: u32,
}

impl QueuedAction {
    /// Creates a new action with a fresh id and the current timestamp.
    ///
    /// Any body supplied with DELETE is dropped.
    pub fn new(method: Method, endpoint: impl Into<String>, body: Option<Value>) -> Self {
        QueuedAction {
            id: Uuid::new_v4().to_string(),
            method,
            endpoint: endpoint.into(),
            body: if method == Method::Delete { None } else { body },
            enqueued_at: Utc::now(),
            retry_count: 0,
        }
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
