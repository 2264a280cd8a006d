// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! Wire protocol messages for the real-time channel.
//!
//! The server pushes typed event envelopes; the client sends keep-alive
//! pings and opaque application payloads. The envelope is deliberately
//! loose: `data` is free-form JSON and the set of event types is open.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved event type acknowledging a client keep-alive ping.
///
/// Filtered out before subscriber dispatch; it is transport plumbing,
/// not an application event.
pub const HEARTBEAT_ACK: &str = "pong";

/// Subscription key that receives every inbound event.
pub const WILDCARD: &str = "*";

/// An event envelope pushed by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerEvent {
    /// Event type, used as the subscription key.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Free-form event payload.
    #[serde(default)]
    pub data: Value,

    /// Server-side emission time, when provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ServerEvent {
    /// Creates an event with the given type and payload.
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        ServerEvent {
            event_type: event_type.into(),
            data,
            timestamp: None,
        }
    }

    /// Returns true if this event is the keep-alive acknowledgment.
    pub fn is_heartbeat_ack(&self) -> bool {
        self.event_type == HEARTBEAT_ACK
    }

    /// Deserializes an event from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serializes the event to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Keep-alive ping, sent periodically while connected.
    Ping,

    /// An opaque application payload (fire-and-forget).
    Data(Value),
}

impl ClientMessage {
    /// Creates a Ping message.
    pub fn ping() -> Self {
        ClientMessage::Ping
    }

    /// Creates a Data message.
    pub fn data(value: Value) -> Self {
        ClientMessage::Data(value)
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        match self {
            ClientMessage::Ping => serde_json::to_string(&serde_json::json!({ "type": "ping" })),
            ClientMessage::Data(value) => serde_json::to_string(value),
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
