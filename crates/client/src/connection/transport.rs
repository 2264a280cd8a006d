// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! Transport abstraction for the real-time channel.
//!
//! Provides a trait-based transport layer that enables:
//! - Real WebSocket connections for production
//! - Mock transports for unit testing
//!
//! The transport hands raw message text upward; envelope parsing (and the
//! drop-malformed policy) belongs to the connection.

use std::future::Future;
use std::pin::Pin;

/// Close code reported when the peer sent no close frame.
pub const CLOSE_NO_STATUS: u16 = 1005;

/// Close code reported when the stream ended without a close handshake.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation attempted on a closed connection.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// One inbound transport event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecvEvent {
    /// A text message arrived.
    Text(String),
    /// The connection closed with the given close code.
    Closed {
        /// WebSocket close code (1005 when the peer sent none).
        code: u16,
    },
}

/// Transport trait for WebSocket-like communication.
///
/// This trait abstracts over the actual transport mechanism, allowing
/// for easy testing with mock implementations.
pub trait Transport: Send + Sync {
    /// Connect to a remote server.
    fn connect(
        &mut self,
        url: &str,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Close the connection intentionally (normal closure).
    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Send a text message to the server.
    fn send(
        &mut self,
        text: String,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Receive the next transport event.
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<RecvEvent>> + Send + '_>>;

    /// Check if connected.
    fn is_connected(&self) -> bool;
}

/// WebSocket transport implementation using tokio-tungstenite.
pub struct WebSocketTransport {
    /// The WebSocket connection, if connected.
    ws: Option<WebSocketConnection>,
}

/// Internal WebSocket connection wrapper.
struct WebSocketConnection {
    sink: futures_util::stream::SplitSink<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
        tokio_tungstenite::tungstenite::Message,
    >,
    stream: futures_util::stream::SplitStream<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    >,
}

impl WebSocketTransport {
    /// Create a new WebSocket transport.
    pub fn new() -> Self {
        WebSocketTransport { ws: None }
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for WebSocketTransport {
    fn connect(
        &mut self,
        url: &str,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        let url = url.to_string();
        Box::pin(async move {
            use futures_util::StreamExt;

            let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
                .await
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

            let (sink, stream) = ws_stream.split();
            self.ws = Some(WebSocketConnection { sink, stream });
            Ok(())
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            if let Some(mut ws) = self.ws.take() {
                use futures_util::SinkExt;
                // close() sends a normal-closure frame (1000)
                let _ = ws
                    .sink
                    .close()
                    .await
                    .map_err(|e| TransportError::SendFailed(e.to_string()));
            }
            Ok(())
        })
    }

    fn send(
        &mut self,
        text: String,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            use futures_util::SinkExt;
            use tokio_tungstenite::tungstenite::Message;

            let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;

            if let Err(e) = ws.sink.send(Message::Text(text.into())).await {
                // Connection is broken, clear it
                self.ws = None;
                return Err(TransportError::SendFailed(e.to_string()));
            }

            // Flush to ensure the data is actually sent and we detect connection failures
            if let Err(e) = ws.sink.flush().await {
                self.ws = None;
                return Err(TransportError::SendFailed(e.to_string()));
            }

            Ok(())
        })
    }

    fn recv(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<RecvEvent>> + Send + '_>> {
        Box::pin(async move {
            use futures_util::StreamExt;
            use tokio_tungstenite::tungstenite::Message;

            let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;

            loop {
                match ws.stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        return Ok(RecvEvent::Text(text.to_string()));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        self.ws = None;
                        let code = frame.map(|f| u16::from(f.code)).unwrap_or(CLOSE_NO_STATUS);
                        return Ok(RecvEvent::Closed { code });
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        // Protocol-level frames; tungstenite answers pings itself
                        continue;
                    }
                    Some(Ok(_)) => {
                        // Ignore other message types
                        continue;
                    }
                    Some(Err(e)) => {
                        self.ws = None;
                        return Err(TransportError::ReceiveFailed(e.to_string()));
                    }
                    None => {
                        // Stream ended without a close handshake
                        self.ws = None;
                        return Ok(RecvEvent::Closed {
                            code: CLOSE_ABNORMAL,
                        });
                    }
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.ws.is_some()
    }
}
