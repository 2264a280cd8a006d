// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! cl-core: Shared library for the classlink real-time client
//!
//! This crate provides the primitives shared by the resilient connection and
//! the durable offline queue: the wire protocol envelope, the queued-action
//! model and its SQLite-backed store, the identity capability, backoff
//! policy, and endpoint derivation.

pub mod action;
pub mod backoff;
pub mod endpoint;
pub mod error;
pub mod identity;
pub mod protocol;
pub mod store;

pub use action::{Method, QueuedAction};
pub use backoff::Backoff;
pub use error::{Error, Result};
pub use identity::{Identity, IdentityProvider, StaticIdentity};
pub use protocol::{ClientMessage, ServerEvent, HEARTBEAT_ACK, WILDCARD};
pub use store::ActionStore;
