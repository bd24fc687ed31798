// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::VecDeque;
use std::time::Duration;

use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tether_core::protocol::{inbound, status, SendMessage};
use tether_core::{ClientEvent, Envelope, MessageSent};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::backoff::Backoff;
use super::session::{ConnectionState, Session};
use crate::error::{Error, Result};
use crate::offline::SharedQueue;
use crate::registry::{Listener, Registry};
use crate::transport::{
    ConnectRequest, Transport, TransportError, TransportResult, WebSocketTransport,
};

const REASON_CLIENT: &str = "client";
const REASON_SERVER: &str = "server";

/// Settings for the real-time session.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Session endpoint, e.g. `ws://localhost:3000/ws`.
    pub url: String,
    /// Delay before the first reconnection attempt.
    pub base_delay: Duration,
    /// Upper bound for any single reconnection delay.
    pub max_delay: Duration,
    /// Consecutive failed attempts before giving up.
    pub max_attempts: u32,
    /// Keep retrying when the server rejects the credentials.
    pub retry_on_auth_rejected: bool,
    /// How long `send_message_confirmed` waits for `message_sent`.
    pub ack_timeout: Duration,
}

impl ConnectionConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.base_delay, self.max_delay)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            url: "ws://localhost:3000/ws".to_string(),
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            max_attempts: 5,
            retry_on_auth_rejected: true,
            ack_timeout: Duration::from_secs(10),
        }
    }
}

/// Server acknowledgment correlating a `tempId` with its server id.
pub type MessageAck = MessageSent;

/// What the session produced for whoever is driving it.
#[derive(Debug, Clone)]
pub enum Activity {
    /// An inbound frame, already dispatched to listeners.
    Frame(Envelope),
    /// The session came back after a drop.
    Reopened,
}

/// What one wait on the transport produced.
enum Incoming {
    Cancelled,
    Frame(Envelope),
    Closed,
    Failed(TransportError),
}

/// Owns the single session to the server and its listeners.
///
/// All traffic goes through `&mut self`, so frames are dispatched in
/// arrival order from whichever task drives [`next_activity`](Self::next_activity),
/// [`next_event`](Self::next_event) or [`run`](Self::run). Other tasks can stop the session through
/// [`cancel_handle`](Self::cancel_handle) and observe it through
/// [`subscribe_state`](Self::subscribe_state).
pub struct ConnectionManager<T: Transport = WebSocketTransport> {
    config: ConnectionConfig,
    backoff: Backoff,
    transport: T,
    registry: Registry,
    session: Session,
    credentials: Option<ConnectRequest>,
    cancel: CancellationToken,
    state_tx: watch::Sender<ConnectionState>,
    queue: Option<SharedQueue>,
    /// Activity seen while waiting for an ack, not yet handed to the driver.
    buffered: VecDeque<Activity>,
}

impl ConnectionManager<WebSocketTransport> {
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_transport(config, WebSocketTransport::new())
    }
}

impl<T: Transport> ConnectionManager<T> {
    /// Create a manager over a custom transport (for testing).
    pub fn with_transport(config: ConnectionConfig, transport: T) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        ConnectionManager {
            backoff: config.backoff(),
            config,
            transport,
            registry: Registry::new(),
            session: Session::default(),
            credentials: None,
            cancel: CancellationToken::new(),
            state_tx,
            queue: None,
            buffered: VecDeque::new(),
        }
    }

    /// Share the offline queue so the session token reaches background replay.
    pub fn attach_queue(&mut self, queue: SharedQueue) {
        self.queue = Some(queue);
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state
    }

    pub fn is_connected(&self) -> bool {
        self.session.state == ConnectionState::Connected && self.transport.is_connected()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Token that stops the session from another task.
    ///
    /// Valid until the next `connect` or `reconnect` after a disconnect.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn on(&mut self, event: &str, listener: Listener) {
        self.registry.on(event, listener);
    }

    pub fn off(&mut self, event: &str, listener: &Listener) -> bool {
        self.registry.off(event, listener)
    }

    /// Open the session. A no-op if already connected.
    ///
    /// If the first try fails the manager keeps retrying on its backoff
    /// schedule and returns once connected or once it gives up.
    pub async fn connect(&mut self, token: &str, user_id: &str) -> Result<Session> {
        if self.is_connected() {
            return Ok(self.session.clone());
        }

        self.credentials = Some(ConnectRequest {
            url: self.config.url.clone(),
            token: token.to_string(),
            user_id: user_id.to_string(),
        });
        self.remember_token(token).await;
        self.session.reconnect_attempts = 0;
        self.establish().await
    }

    /// Start a fresh reconnection schedule, e.g. after `Failed`.
    pub async fn reconnect(&mut self) -> Result<Session> {
        if self.credentials.is_none() {
            return Err(Error::InvalidInput(
                "reconnect requires a prior connect".to_string(),
            ));
        }
        if self.is_connected() {
            return Ok(self.session.clone());
        }
        self.session.reconnect_attempts = 0;
        self.establish().await
    }

    /// Close the session and stop any pending reconnection.
    pub async fn disconnect(&mut self) {
        self.cancel.cancel();
        if self.session.state != ConnectionState::Disconnected {
            self.finish_disconnect(REASON_CLIENT).await;
        }
    }

    /// Send an event on the open session. Never queues.
    pub async fn send(&mut self, event: ClientEvent) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }

        let name = event.name();
        let envelope = event.into_envelope()?;
        if let Err(e) = self.transport.send(envelope).await {
            self.record_error(&e);
            return Err(e.into());
        }
        tracing::debug!(event = name, "sent");
        Ok(())
    }

    pub async fn send_message(&mut self, message: SendMessage) -> Result<()> {
        if message.temp_id.trim().is_empty() {
            return Err(Error::MissingTempId);
        }
        self.send(ClientEvent::SendMessage(message)).await
    }

    /// Send a message and wait for the server's `message_sent` for its `tempId`.
    ///
    /// Frames arriving meanwhile, the ack included, are dispatched to
    /// listeners and kept for the next [`next_activity`](Self::next_activity).
    pub async fn send_message_confirmed(&mut self, message: SendMessage) -> Result<MessageAck> {
        let temp_id = message.temp_id.clone();
        self.send_message(message).await?;

        let timeout = self.config.ack_timeout;
        let wait = async {
            loop {
                let activity = self.pump().await?;
                let ack = match &activity {
                    Activity::Frame(envelope) => match_ack(envelope, &temp_id),
                    Activity::Reopened => None,
                };
                self.buffered.push_back(activity);
                if ack.is_some() {
                    return ack;
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(Some(ack)) => Ok(ack),
            Ok(None) => Err(Error::NotConnected),
            Err(_) => Err(Error::AckTimeout {
                temp_id,
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Wait for the next thing the session does.
    ///
    /// Frames are dispatched to listeners before they are returned. Drops
    /// are handled here: the manager reconnects and reports
    /// [`Activity::Reopened`]. Returns `None` once the session is
    /// disconnected or has given up.
    pub async fn next_activity(&mut self) -> Option<Activity> {
        if let Some(activity) = self.buffered.pop_front() {
            return Some(activity);
        }
        self.pump().await
    }

    /// Wait for the next inbound frame, reconnecting through drops.
    pub async fn next_event(&mut self) -> Option<Envelope> {
        loop {
            if let Activity::Frame(envelope) = self.next_activity().await? {
                return Some(envelope);
            }
        }
    }

    async fn pump(&mut self) -> Option<Activity> {
        match self.session.state {
            ConnectionState::Connected => {}
            ConnectionState::Disconnected | ConnectionState::Failed => return None,
            // An earlier wait was dropped mid-schedule; resume it
            ConnectionState::Connecting | ConnectionState::Reconnecting => {
                self.reconnect_loop(None).await.ok()?;
                return Some(Activity::Reopened);
            }
        }

        let cancel = self.cancel.clone();
        let incoming = tokio::select! {
            _ = cancel.cancelled() => Incoming::Cancelled,
            result = self.transport.recv() => match result {
                Ok(Some(envelope)) => Incoming::Frame(envelope),
                Ok(None) => Incoming::Closed,
                Err(e) => Incoming::Failed(e),
            },
        };

        let failure = match incoming {
            Incoming::Cancelled => {
                self.finish_disconnect(REASON_CLIENT).await;
                return None;
            }
            Incoming::Frame(envelope) => {
                self.registry.emit(&envelope.event, &envelope.data);
                return Some(Activity::Frame(envelope));
            }
            Incoming::Closed => {
                tracing::info!("session closed by server");
                self.session.session_id = None;
                self.emit(status::SOCKET_DISCONNECTED, json!({ "reason": REASON_SERVER }));
                None
            }
            Incoming::Failed(e) => {
                self.record_error(&e);
                Some(e)
            }
        };

        self.reconnect_loop(failure).await.ok()?;
        Some(Activity::Reopened)
    }

    /// Dispatch frames until the session stops.
    pub async fn run(&mut self) {
        while self.next_activity().await.is_some() {}
    }

    async fn establish(&mut self) -> Result<Session> {
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }

        self.set_state(ConnectionState::Connecting);
        if let Err(e) = self.open().await {
            self.record_error(&e);
            if self.gives_up_on(&e) {
                self.give_up();
                return Err(e.into());
            }
            self.reconnect_loop(Some(e)).await?;
        }
        Ok(self.session.clone())
    }

    async fn open(&mut self) -> TransportResult<()> {
        let Some(request) = self.credentials.clone() else {
            return Err(TransportError::ConnectionFailed("no credentials".to_string()));
        };

        let handshake = self.transport.connect(&request).await?;
        let session_id = handshake
            .session_id
            .unwrap_or_else(|| local_session_id(&request.user_id));

        tracing::info!(%session_id, url = %request.url, "session open");
        self.session.session_id = Some(session_id.clone());
        self.session.reconnect_attempts = 0;
        self.session.last_error = None;
        self.set_state(ConnectionState::Connected);
        self.emit(status::SOCKET_CONNECTED, json!({ "sessionId": session_id }));
        Ok(())
    }

    async fn reconnect_loop(&mut self, mut last_failure: Option<TransportError>) -> Result<()> {
        let cancel = self.cancel.clone();

        loop {
            if self.session.reconnect_attempts >= self.config.max_attempts {
                self.give_up();
                return Err(last_failure.map_or(Error::NotConnected, Error::Transport));
            }

            let attempt = self.session.reconnect_attempts + 1;
            let delay = self.backoff.delay(self.session.reconnect_attempts);
            let delay_ms = delay.as_millis() as u64;
            self.set_state(ConnectionState::Reconnecting);
            tracing::info!(attempt, delay_ms, "reconnecting");
            self.emit(
                status::SOCKET_RECONNECTING,
                json!({ "attempt": attempt, "delayMs": delay_ms }),
            );

            let cancelled = tokio::select! {
                _ = cancel.cancelled() => true,
                _ = tokio::time::sleep(delay) => false,
            };
            if cancelled {
                self.finish_disconnect(REASON_CLIENT).await;
                return Err(Error::NotConnected);
            }

            match self.open().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    self.session.reconnect_attempts += 1;
                    self.record_error(&e);
                    if self.gives_up_on(&e) {
                        self.give_up();
                        return Err(e.into());
                    }
                    last_failure = Some(e);
                }
            }
        }
    }

    async fn finish_disconnect(&mut self, reason: &str) {
        if let Err(e) = self.transport.disconnect().await {
            tracing::debug!(error = %e, "transport close failed");
        }
        self.session.session_id = None;
        self.set_state(ConnectionState::Disconnected);
        tracing::info!(reason, "session closed");
        self.emit(status::SOCKET_DISCONNECTED, json!({ "reason": reason }));
    }

    fn gives_up_on(&self, error: &TransportError) -> bool {
        error.is_auth_rejected() && !self.config.retry_on_auth_rejected
    }

    fn give_up(&mut self) {
        let attempts = self.session.reconnect_attempts;
        tracing::warn!(attempts, "giving up on reconnection");
        self.set_state(ConnectionState::Failed);
        self.emit(status::SOCKET_RECONNECT_FAILED, json!({ "attempts": attempts }));
    }

    fn record_error(&mut self, error: &TransportError) {
        tracing::warn!(%error, "session error");
        self.session.last_error = Some(error.to_string());
        self.emit(status::SOCKET_ERROR, json!({ "message": error.to_string() }));
    }

    async fn remember_token(&self, token: &str) {
        let Some(queue) = &self.queue else {
            return;
        };
        if let Err(e) = queue.lock().await.set_auth_token(token) {
            tracing::warn!(error = %e, "could not persist session token");
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.session.state = state;
        self.state_tx.send_replace(state);
    }

    fn emit(&self, event: &str, data: Value) {
        self.registry.emit(event, &data);
    }
}

fn match_ack(envelope: &Envelope, temp_id: &str) -> Option<MessageAck> {
    if envelope.event != inbound::MESSAGE_SENT {
        return None;
    }
    let sent: MessageSent = envelope.data_as().ok()?;
    (sent.temp_id == temp_id).then_some(sent)
}

/// Session id used when the server does not assign one.
fn local_session_id(user_id: &str) -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(nanos.to_be_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("local-{}", &digest[..16])
}
