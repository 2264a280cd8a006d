// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! classlink: resilient real-time client with a durable offline queue
//!
//! Two independent resilience mechanisms layered under the same
//! unreliable-network assumption:
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Connection  │────►│  Transport  │────►│   Server    │
//! │ (subscribe/  │◄────│   (trait)   │◄────│  (channel)  │
//! │  send/run)   │     └─────────────┘     └─────────────┘
//! └──────────────┘
//! ┌──────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ OfflineQueue │────►│  Executor   │────►│   Server    │
//! │ (queue/sync) │◄────│   (trait)   │◄────│   (HTTP)    │
//! └──────┬───────┘     └─────────────┘     └─────────────┘
//!        ▼
//! ┌──────────────┐
//! │ ActionStore  │  (SQLite, replay-ordered)
//! └──────────────┘
//! ```
//!
//! The connection fans incoming events out to subscribers and recovers from
//! drops with capped exponential backoff; the queue durably persists
//! mutations made while offline and replays them in order once connectivity
//! returns. Neither calls the other.

pub mod connection;
pub mod queue;

pub use connection::{
    Connection, ConnectionConfig, ConnectionError, ConnectionState, RecvEvent, Subscription,
    Transport, TransportError, WebSocketTransport,
};
pub use queue::{ActionExecutor, HttpExecutor, OfflineQueue, ReplayOutcome};
