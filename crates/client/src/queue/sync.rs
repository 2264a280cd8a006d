// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! Offline queue and its synchronization engine.
//!
//! All methods take `&self`; the queue is designed to be shared behind an
//! `Arc`, with overlapping sync passes collapsing to one via an atomic
//! claim taken before the first suspension point.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use cl_core::action::{Method, QueuedAction};
use cl_core::identity::IdentityProvider;
use cl_core::store::ActionStore;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::executor::ActionExecutor;

/// Maximum failed replay attempts before an action is discarded.
pub const MAX_ACTION_RETRIES: u32 = 3;

/// Durable queue of pending mutations with ordered replay.
pub struct OfflineQueue<E: ActionExecutor> {
    /// Durable store; locked per operation, never across an await.
    store: Mutex<ActionStore>,
    /// Replay executor.
    executor: E,
    /// Credential source for replayed requests.
    identity: Arc<dyn IdentityProvider>,
    /// Mirror of the runtime's connectivity signal.
    online: AtomicBool,
    /// Claimed for the duration of one sync pass.
    syncing: AtomicBool,
    /// Number of durably pending actions, kept in sync after every
    /// mutation.
    queued_count: AtomicUsize,
}

impl<E: ActionExecutor> OfflineQueue<E> {
    /// Creates a queue over the given store, executor, and identity.
    ///
    /// Starts online; the count is primed from storage (a failed read
    /// degrades to zero rather than failing construction).
    pub fn new(store: ActionStore, executor: E, identity: Arc<dyn IdentityProvider>) -> Self {
        let initial_count = store.len().unwrap_or_else(|e| {
            warn!(error = %e, "could not read pending count; assuming empty");
            0
        });

        OfflineQueue {
            store: Mutex::new(store),
            executor,
            identity,
            online: AtomicBool::new(true),
            syncing: AtomicBool::new(false),
            queued_count: AtomicUsize::new(initial_count),
        }
    }

    /// Whether the queue currently believes the device is online.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// True only while a sync pass is actively running.
    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Number of durably pending actions.
    pub fn queued_count(&self) -> usize {
        self.queued_count.load(Ordering::Acquire)
    }

    /// Updates the connectivity flag; an offline→online transition
    /// triggers a sync pass.
    pub async fn set_online(&self, online: bool) {
        let was_online = self.online.swap(online, Ordering::AcqRel);
        if online && !was_online {
            info!("connectivity restored; syncing queue");
            self.sync_queue().await;
        }
    }

    /// Durably enqueues a mutation for later replay.
    ///
    /// The record is committed to storage before this returns, so the
    /// action survives a crash immediately afterwards. A storage failure
    /// is returned to the caller, who should fall back to a direct
    /// request.
    pub fn queue_action(
        &self,
        method: Method,
        endpoint: impl Into<String>,
        body: Option<Value>,
    ) -> cl_core::Result<QueuedAction> {
        let action = QueuedAction::new(method, endpoint, body);
        self.lock_store().insert(&action)?;
        self.refresh_count();
        debug!(id = %action.id, method = %action.method, endpoint = %action.endpoint, "action queued");
        Ok(action)
    }

    /// Replays pending actions in enqueue order. Returns the number
    /// successfully applied.
    ///
    /// Idempotent under concurrency: the `syncing` flag is claimed before
    /// the first await, so an overlapping call is a no-op. The pass stops
    /// (leaving the remainder untouched) as soon as the connectivity flag
    /// goes false. A failing action is retained in place with its retry
    /// count bumped, and discarded permanently once the count exceeds
    /// [`MAX_ACTION_RETRIES`].
    pub async fn sync_queue(&self) -> usize {
        if self
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("sync already in progress");
            return 0;
        }
        let _guard = SyncGuard(&self.syncing);

        // Snapshot in replay order; actions queued mid-pass wait for the
        // next pass.
        let snapshot = match self.lock_store().all() {
            Ok(actions) => actions,
            Err(e) => {
                warn!(error = %e, "queue unreadable; skipping sync");
                return 0;
            }
        };

        if snapshot.is_empty() {
            return 0;
        }
        info!(pending = snapshot.len(), "sync pass starting");

        let mut applied = 0;
        for action in &snapshot {
            if !self.is_online() {
                debug!("went offline; leaving remaining actions queued");
                break;
            }

            let token = self.identity.identity().map(|i| i.token);
            let outcome = self.executor.execute(action, token.as_deref()).await;

            if outcome.is_success() {
                if let Err(e) = self.lock_store().remove(&action.id) {
                    warn!(id = %action.id, error = %e, "replayed but could not remove record");
                }
                applied += 1;
                self.refresh_count();
                continue;
            }

            debug!(id = %action.id, ?outcome, "replay failed");
            // Bind first so the store lock is released before any further
            // store call below.
            let bumped = self.lock_store().bump_retry(&action.id);
            match bumped {
                Ok(count) if count > MAX_ACTION_RETRIES => {
                    warn!(
                        id = %action.id,
                        endpoint = %action.endpoint,
                        retries = count,
                        "action exhausted retries; discarding"
                    );
                    if let Err(e) = self.lock_store().remove(&action.id) {
                        warn!(id = %action.id, error = %e, "could not discard exhausted action");
                    }
                    self.refresh_count();
                }
                Ok(_) => {}
                Err(e) => warn!(id = %action.id, error = %e, "could not record retry"),
            }
        }

        self.refresh_count();
        info!(applied, remaining = self.queued_count(), "sync pass finished");
        applied
    }

    /// Durably removes every pending action.
    ///
    /// For explicit user-initiated abandonment, not normal flow.
    pub fn clear_queue(&self) {
        match self.lock_store().clear() {
            Ok(removed) => info!(removed, "queue cleared"),
            Err(e) => warn!(error = %e, "could not clear queue"),
        }
        self.refresh_count();
    }

    /// Read-only snapshot of pending actions, for diagnostics/UI.
    ///
    /// Storage failures degrade to an empty snapshot.
    pub fn get_queue(&self) -> Vec<QueuedAction> {
        self.lock_store().all().unwrap_or_else(|e| {
            warn!(error = %e, "queue unreadable");
            Vec::new()
        })
    }

    fn refresh_count(&self) {
        let count = self.lock_store().len().unwrap_or(0);
        self.queued_count.store(count, Ordering::Release);
    }

    fn lock_store(&self) -> MutexGuard<'_, ActionStore> {
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Clears the syncing flag when a pass ends, however it ends.
struct SyncGuard<'a>(&'a AtomicBool);

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
