// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for the real-time session.
//!
//! Provides a trait-based transport layer that enables:
//! - Real WebSocket connections for production
//! - Mock transports for unit testing

use std::future::Future;
use std::pin::Pin;

use tether_core::Envelope;

/// Response header carrying the server-assigned session id.
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Request header carrying the user identity.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Error type for transport operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The server refused the session credentials at handshake.
    #[error("authentication rejected (HTTP {0})")]
    AuthRejected(u16),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl TransportError {
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, TransportError::AuthRejected(_))
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Everything needed to open a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub url: String,
    pub token: String,
    pub user_id: String,
}

/// What the server told us while opening the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Handshake {
    pub session_id: Option<String>,
}

/// Transport trait for WebSocket-like communication.
///
/// This trait abstracts over the actual transport mechanism, allowing
/// for easy testing with mock implementations.
pub trait Transport: Send + Sync {
    /// Open a session, presenting the request's credentials.
    fn connect(
        &mut self,
        request: &ConnectRequest,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Handshake>> + Send + '_>>;

    /// Disconnect from the server.
    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Send a frame to the server.
    fn send(
        &mut self,
        envelope: Envelope,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Receive a frame from the server.
    ///
    /// Returns `None` if the connection is closed.
    fn recv(&mut self)
        -> Pin<Box<dyn Future<Output = TransportResult<Option<Envelope>>> + Send + '_>>;

    /// Check if connected.
    fn is_connected(&self) -> bool;
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// WebSocket transport implementation using tokio-tungstenite.
pub struct WebSocketTransport {
    /// The WebSocket connection, if connected.
    ws: Option<WebSocketConnection>,
}

/// Internal WebSocket connection wrapper.
struct WebSocketConnection {
    sink: futures_util::stream::SplitSink<WsStream, tokio_tungstenite::tungstenite::Message>,
    stream: futures_util::stream::SplitStream<WsStream>,
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
        request: &ConnectRequest,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Handshake>> + Send + '_>> {
        let request = request.clone();
        Box::pin(async move {
            use futures_util::StreamExt;
            use tokio_tungstenite::tungstenite::client::IntoClientRequest;
            use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
            use tokio_tungstenite::tungstenite::http::HeaderValue;
            use tokio_tungstenite::tungstenite::Error as WsError;

            let mut upgrade = request
                .url
                .as_str()
                .into_client_request()
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", request.token))
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
            let user_id = HeaderValue::from_str(&request.user_id)
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
            upgrade.headers_mut().insert(AUTHORIZATION, bearer);
            upgrade.headers_mut().insert(USER_ID_HEADER, user_id);

            let (ws_stream, response) = match tokio_tungstenite::connect_async(upgrade).await {
                Ok(connected) => connected,
                Err(WsError::Http(response)) => {
                    let status = response.status().as_u16();
                    return Err(if status == 401 || status == 403 {
                        TransportError::AuthRejected(status)
                    } else {
                        TransportError::ConnectionFailed(format!("HTTP {}", status))
                    });
                }
                Err(e) => return Err(TransportError::ConnectionFailed(e.to_string())),
            };

            let session_id = response
                .headers()
                .get(SESSION_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let (sink, stream) = ws_stream.split();
            self.ws = Some(WebSocketConnection { sink, stream });
            Ok(Handshake { session_id })
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            if let Some(mut ws) = self.ws.take() {
                use futures_util::SinkExt;
                let _ = ws.sink.close().await;
            }
            Ok(())
        })
    }

    fn send(
        &mut self,
        envelope: Envelope,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            use futures_util::SinkExt;
            use tokio_tungstenite::tungstenite::Message;

            let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;

            let json = envelope
                .to_json()
                .map_err(|e| TransportError::SerializationError(e.to_string()))?;

            if let Err(e) = ws.sink.send(Message::Text(json.into())).await {
                // Connection is broken, clear it
                self.ws = None;
                return Err(TransportError::SendFailed(e.to_string()));
            }

            Ok(())
        })
    }

    fn recv(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Option<Envelope>>> + Send + '_>> {
        Box::pin(async move {
            use futures_util::StreamExt;
            use tokio_tungstenite::tungstenite::Message;

            let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;

            loop {
                match ws.stream.next().await {
                    Some(Ok(Message::Text(text))) => match Envelope::from_json(&text) {
                        Ok(envelope) => return Ok(Some(envelope)),
                        Err(e) => {
                            tracing::warn!(error = %e, "dropping malformed frame");
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        self.ws = None;
                        return Ok(None);
                    }
                    Some(Ok(_)) => {
                        // Ping/pong and binary frames carry no events
                        continue;
                    }
                    Some(Err(e)) => {
                        self.ws = None;
                        return Err(TransportError::ReceiveFailed(e.to_string()));
                    }
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.ws.is_some()
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
