// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! Resilient connection to the real-time channel.
//!
//! Provides a high-level interface for:
//! - Connecting behind an authentication/role guard
//! - Subscribing to named event types (with wildcard)
//! - Fire-and-forget sends
//! - Automatic reconnection with capped exponential backoff and keep-alive

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use cl_core::backoff::{Backoff, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY};
use cl_core::endpoint;
use cl_core::identity::IdentityProvider;
use cl_core::protocol::ServerEvent;
use cl_core::ClientMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::registry::{Handler, SubscriberRegistry, SubscriptionId};
use super::transport::{RecvEvent, Transport, TransportError, WebSocketTransport, CLOSE_ABNORMAL};

/// Normal closure; the peer (or we) closed intentionally.
pub const CLOSE_NORMAL: u16 = 1000;

/// Server rejected the credential.
pub const CLOSE_UNAUTHORIZED: u16 = 4001;

/// Server rejected the caller's role.
pub const CLOSE_FORBIDDEN: u16 = 4003;

/// Close codes that must never trigger an automatic reconnect.
///
/// Retrying after an auth rejection would be pointless and potentially
/// abusive.
pub const NO_RECONNECT_CODES: [u16; 3] = [CLOSE_NORMAL, CLOSE_UNAUTHORIZED, CLOSE_FORBIDDEN];

/// Configuration for the resilient connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Base API URL the channel URL is derived from.
    pub base_url: String,
    /// Logical channel role appended to the URL path.
    pub channel: String,
    /// When set, only identities with this role may connect.
    pub required_role: Option<String>,
    /// Keep-alive interval.
    pub heartbeat: Duration,
    /// Initial delay for exponential backoff.
    pub initial_delay: Duration,
    /// Maximum delay between reconnection attempts.
    pub max_delay: Duration,
    /// Maximum automatic reconnection attempts.
    pub max_retries: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            base_url: "http://localhost:8080".to_string(),
            channel: "events".to_string(),
            required_role: None,
            heartbeat: Duration::from_secs(30),
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_retries: 10,
        }
    }
}

/// Error type for connection operations.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Endpoint derivation failed.
    #[error("endpoint error: {0}")]
    Endpoint(#[from] cl_core::Error),
}

/// Result type for connection operations.
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// State of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected.
    Disconnected,
    /// Attempting to connect.
    Connecting,
    /// Connected to the channel.
    Connected,
    /// Intentional close in progress.
    Closing,
}

/// Guard for one subscription; explicit unsubscribe, idempotent.
///
/// Dropping the guard does not unsubscribe: handlers outlive the scope that
/// registered them unless removed explicitly.
pub struct Subscription {
    id: SubscriptionId,
    registry: Arc<Mutex<SubscriberRegistry>>,
}

impl Subscription {
    /// Removes exactly this handler. Returns true on the first call,
    /// false on repeats.
    pub fn unsubscribe(&self) -> bool {
        lock_registry(&self.registry).unsubscribe(self.id)
    }
}

/// Resilient connection to the server's event channel.
pub struct Connection<T: Transport = WebSocketTransport> {
    /// Configuration.
    config: ConnectionConfig,
    /// Transport layer.
    transport: T,
    /// Identity source consulted before every connect attempt.
    identity: Arc<dyn IdentityProvider>,
    /// Subscriber registry, shared with subscription guards.
    registry: Arc<Mutex<SubscriberRegistry>>,
    /// Connection state.
    state: ConnectionState,
    /// Backoff policy.
    backoff: Backoff,
    /// Consecutive failed attempts since the last successful open.
    attempts: u32,
    /// Most recently dispatched event.
    last_event: Option<ServerEvent>,
    /// Cancels pending reconnect sleeps and the run loop.
    cancel: CancellationToken,
    /// Optional hook observing transport errors.
    on_error: Option<Box<dyn Fn(&TransportError) + Send>>,
}

impl Connection<WebSocketTransport> {
    /// Creates a connection with the default WebSocket transport.
    pub fn new(config: ConnectionConfig, identity: Arc<dyn IdentityProvider>) -> Self {
        Connection::with_transport(config, WebSocketTransport::new(), identity)
    }
}

impl<T: Transport> Connection<T> {
    /// Creates a connection with a custom transport (for testing).
    pub fn with_transport(
        config: ConnectionConfig,
        transport: T,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let backoff = Backoff::new(config.initial_delay, config.max_delay);
        Connection {
            config,
            transport,
            identity,
            registry: Arc::new(Mutex::new(SubscriberRegistry::new())),
            state: ConnectionState::Disconnected,
            backoff,
            attempts: 0,
            last_event: None,
            cancel: CancellationToken::new(),
            on_error: None,
        }
    }

    /// Installs a hook invoked on transport errors.
    ///
    /// Errors alone cause no state transition; the subsequent close event
    /// is authoritative.
    pub fn on_error(&mut self, hook: impl Fn(&TransportError) + Send + 'static) {
        self.on_error = Some(Box::new(hook));
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected && self.transport.is_connected()
    }

    /// The most recently dispatched event, or None before any arrived.
    pub fn last_event(&self) -> Option<&ServerEvent> {
        self.last_event.as_ref()
    }

    /// Consecutive failed attempts since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// A token that cancels a running [`Connection::run`] loop and any
    /// pending reconnect sleep.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Connect to the channel. Idempotent: a no-op when already connected.
    ///
    /// The attempt is guarded: an unauthenticated identity, or one whose
    /// role does not match `required_role`, silently skips the connect.
    /// That is deliberate gating, not a failure.
    pub async fn connect(&mut self) -> ConnectionResult<()> {
        if self.is_connected() {
            return Ok(());
        }

        let Some(identity) = self.identity.identity() else {
            debug!("connect skipped: not authenticated");
            return Ok(());
        };
        if let Some(required) = &self.config.required_role {
            if identity.role != *required {
                debug!(role = %identity.role, required = %required, "connect skipped: role mismatch");
                return Ok(());
            }
        }

        // One transport at a time: tear down any stale connection first,
        // without going through the reconnect path.
        if self.transport.is_connected() {
            self.transport.disconnect().await?;
        }

        self.state = ConnectionState::Connecting;
        let url = endpoint::channel_url(&self.config.base_url, &self.config.channel, &identity.token)?;

        match self.transport.connect(&url).await {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                self.attempts = 0;
                info!(channel = %self.config.channel, "connected");
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                Err(e.into())
            }
        }
    }

    /// Disconnect intentionally. Idempotent.
    ///
    /// Cancels any pending reconnect before the close frame goes out, so
    /// the retry timer can never fire afterwards.
    pub async fn disconnect(&mut self) -> ConnectionResult<()> {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();

        if self.state == ConnectionState::Disconnected && !self.transport.is_connected() {
            return Ok(());
        }

        self.state = ConnectionState::Closing;
        self.transport.disconnect().await?;
        self.state = ConnectionState::Disconnected;
        info!(channel = %self.config.channel, "disconnected");
        Ok(())
    }

    /// Manual "retry now": disconnect, reset backoff state, connect.
    pub async fn reconnect(&mut self) -> ConnectionResult<()> {
        self.disconnect().await?;
        self.attempts = 0;
        self.connect().await
    }

    /// Registers a handler for the given event type.
    ///
    /// [`cl_core::WILDCARD`] subscribes to every event. Registration alone
    /// never opens the transport.
    pub fn subscribe(&self, event_type: &str, handler: impl Fn(&ServerEvent) + Send + 'static) -> Subscription {
        let id = lock_registry(&self.registry).subscribe(event_type, Box::new(handler) as Handler);
        Subscription {
            id,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Transmits a payload iff the transport is currently open; otherwise
    /// the message is silently dropped.
    ///
    /// Fire-and-forget: callers needing guaranteed delivery must use the
    /// offline queue instead.
    pub async fn send_message(&mut self, payload: serde_json::Value) {
        if !self.is_connected() {
            debug!("send dropped: not connected");
            return;
        }
        match ClientMessage::data(payload).to_json() {
            Ok(text) => {
                if let Err(e) = self.transport.send(text).await {
                    warn!(error = %e, "send failed");
                    self.notify_error(&e);
                }
            }
            Err(e) => warn!(error = %e, "send dropped: unserializable payload"),
        }
    }

    /// Drives the connection until cancelled, intentionally closed, or
    /// retries are exhausted.
    ///
    /// Sends a keep-alive ping every heartbeat interval while connected,
    /// dispatches inbound events, and schedules backoff-delayed
    /// reconnects on unexpected closes.
    pub async fn run(&mut self) {
        let cancel = self.cancel.clone();

        loop {
            if cancel.is_cancelled() {
                return;
            }

            if !self.is_connected() {
                match self.connect().await {
                    Ok(()) => {
                        if !self.is_connected() {
                            // Auth guard declined; nothing to drive.
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "connect attempt failed");
                        match self.next_retry() {
                            Some(delay) => {
                                if !sleep_unless_cancelled(delay, &cancel).await {
                                    return;
                                }
                                continue;
                            }
                            None => return,
                        }
                    }
                }
            }

            match self.pump(&cancel).await {
                Pump::Cancelled => {
                    let _ = self.transport.disconnect().await;
                    self.state = ConnectionState::Disconnected;
                    return;
                }
                Pump::Stopped => return,
                Pump::Retry(delay) => {
                    if !sleep_unless_cancelled(delay, &cancel).await {
                        return;
                    }
                }
            }
        }
    }

    /// Receives and dispatches until the connection drops.
    ///
    /// The keep-alive ticks on a fixed cadence, independent of inbound
    /// traffic.
    async fn pump(&mut self, cancel: &CancellationToken) -> Pump {
        let mut keepalive = tokio::time::interval_at(
            tokio::time::Instant::now() + self.config.heartbeat,
            self.config.heartbeat,
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Pump::Cancelled,
                _ = keepalive.tick() => self.send_ping().await,
                outcome = self.transport.recv() => match outcome {
                    Ok(RecvEvent::Text(text)) => self.handle_incoming(&text),
                    Ok(RecvEvent::Closed { code }) => {
                        return match self.handle_close(code) {
                            Some(delay) => Pump::Retry(delay),
                            None => Pump::Stopped,
                        };
                    }
                    Err(e) => {
                        // The error itself is not authoritative; the close
                        // (or the cleared transport) decides what happens.
                        warn!(error = %e, "transport error");
                        self.notify_error(&e);
                        if !self.transport.is_connected() {
                            return match self.handle_close(CLOSE_ABNORMAL) {
                                Some(delay) => Pump::Retry(delay),
                                None => Pump::Stopped,
                            };
                        }
                    }
                },
            }
        }
    }

    /// Sends a keep-alive ping, ignoring failures (the close that follows
    /// a dead link is handled by the receive path).
    async fn send_ping(&mut self) {
        if !self.is_connected() {
            return;
        }
        if let Ok(text) = ClientMessage::ping().to_json() {
            if let Err(e) = self.transport.send(text).await {
                debug!(error = %e, "keep-alive send failed");
                self.notify_error(&e);
            }
        }
    }

    /// Parses and dispatches one inbound message.
    ///
    /// Malformed payloads are dropped with a warning; the keep-alive ack
    /// is filtered before dispatch.
    pub(crate) fn handle_incoming(&mut self, text: &str) {
        let event = match ServerEvent::from_json(text) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "dropping malformed message");
                return;
            }
        };

        if event.is_heartbeat_ack() {
            debug!("heartbeat ack");
            return;
        }

        lock_registry(&self.registry).dispatch(&event);
        self.last_event = Some(event);
    }

    /// Records a close and decides whether to reconnect.
    ///
    /// Returns the backoff delay before the next attempt, or None when no
    /// automatic reconnect may happen (intentional/auth closes, or retry
    /// budget exhausted).
    pub(crate) fn handle_close(&mut self, code: u16) -> Option<Duration> {
        self.state = ConnectionState::Disconnected;

        if NO_RECONNECT_CODES.contains(&code) {
            info!(code, "closed; not reconnecting");
            return None;
        }

        self.next_retry()
    }

    /// Claims the next retry slot, or None once the budget is spent.
    fn next_retry(&mut self) -> Option<Duration> {
        if self.attempts >= self.config.max_retries {
            warn!(
                attempts = self.attempts,
                "reconnect attempts exhausted; waiting for manual reconnect"
            );
            return None;
        }
        self.attempts += 1;
        let delay = self.backoff.delay_for(self.attempts);
        info!(attempt = self.attempts, ?delay, "reconnect scheduled");
        Some(delay)
    }

    fn notify_error(&self, error: &TransportError) {
        if let Some(hook) = &self.on_error {
            hook(error);
        }
    }
}

/// Outcome of one pump session.
enum Pump {
    /// Cancelled from outside; close intentionally.
    Cancelled,
    /// Closed with no reconnect allowed.
    Stopped,
    /// Closed; retry after the given delay.
    Retry(Duration),
}

/// Sleeps for `delay`; returns false if cancelled first.
async fn sleep_unless_cancelled(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

fn lock_registry(registry: &Mutex<SubscriberRegistry>) -> MutexGuard<'_, SubscriberRegistry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
