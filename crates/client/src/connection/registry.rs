// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! Observer registry for event fan-out.
//!
//! Maps event-type strings to ordered handler slots. Each subscription gets
//! a unique id so unsubscribe removes exactly one handler and is idempotent.
//! Handlers run under `catch_unwind`: one panicking subscriber cannot break
//! delivery to the others.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use cl_core::protocol::{ServerEvent, WILDCARD};
use tracing::warn;

/// A subscriber callback invoked with each matching event.
pub type Handler = Box<dyn Fn(&ServerEvent) + Send>;

/// Opaque handle identifying one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Registry of event subscribers.
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: u64,
    handlers: HashMap<String, Vec<(SubscriptionId, Handler)>>,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        SubscriberRegistry::default()
    }

    /// Registers a handler for the given event type.
    ///
    /// Use [`WILDCARD`] to receive every event.
    pub fn subscribe(&mut self, event_type: &str, handler: Handler) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.handlers
            .entry(event_type.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    /// Removes the handler with the given id.
    ///
    /// Returns true if a handler was removed; a repeated call is a no-op.
    /// The map entry is freed when its last handler goes.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let mut removed = false;
        self.handlers.retain(|_, slots| {
            let before = slots.len();
            slots.retain(|(slot_id, _)| *slot_id != id);
            removed |= slots.len() < before;
            !slots.is_empty()
        });
        removed
    }

    /// Delivers an event to its type-specific handlers, then to wildcard
    /// handlers. Returns the number of handlers invoked.
    pub fn dispatch(&self, event: &ServerEvent) -> usize {
        let mut delivered = 0;
        let mut keys = vec![event.event_type.as_str()];
        if event.event_type != WILDCARD {
            keys.push(WILDCARD);
        }
        for key in keys {
            if let Some(slots) = self.handlers.get(key) {
                for (id, handler) in slots {
                    if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                        warn!(
                            event_type = %event.event_type,
                            subscription = ?id,
                            "subscriber panicked during dispatch"
                        );
                    }
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Returns the number of handlers registered for an event type.
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers.get(event_type).map_or(0, Vec::len)
    }

    /// Returns true if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
