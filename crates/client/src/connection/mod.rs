// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! Resilient real-time connection.
//!
//! Maintains a single live, authenticated event channel to the server,
//! transparently recovering from drops, and fans incoming events out to
//! subscribers without them needing to know about reconnects.
//!
//! # Features
//!
//! - Authentication/role guard before any transport is opened
//! - Automatic reconnect with capped exponential backoff
//! - Close codes for normal closure and auth failure never retried
//! - Periodic keep-alive with the ack filtered before dispatch
//! - Panic-isolated subscriber fan-out with wildcard support
//! - Injectable transport trait for testing

mod client;
mod registry;
mod transport;

pub use client::{
    Connection, ConnectionConfig, ConnectionError, ConnectionResult, ConnectionState,
    Subscription, CLOSE_FORBIDDEN, CLOSE_NORMAL, CLOSE_UNAUTHORIZED, NO_RECONNECT_CODES,
};
pub use registry::{SubscriberRegistry, SubscriptionId};
pub use transport::{RecvEvent, Transport, TransportError, TransportResult, WebSocketTransport};
