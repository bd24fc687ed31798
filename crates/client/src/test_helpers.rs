// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles for the client crate.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tether_core::{Envelope, PendingAction, ReplayTarget, WriteError, WriteFuture};
use tether_ipc::{AgentRequest, AgentResponse, AgentState, AgentStatus};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use crate::agent_client::{AgentFuture, AgentLink};
use crate::transport::{ConnectRequest, Handshake, Transport, TransportError, TransportResult};

/// What the next `recv()` call yields.
#[derive(Debug, Clone)]
pub enum Scripted {
    Frame(Envelope),
    Close,
    Error(TransportError),
}

#[derive(Debug, Default)]
pub struct MockState {
    pub connected: bool,
    /// Results for upcoming `connect()` calls; when empty, `fail_connect` decides.
    pub connect_script: VecDeque<TransportResult<Handshake>>,
    pub fail_connect: Option<TransportError>,
    /// Frames for upcoming `recv()` calls; when empty, `recv()` never resolves.
    pub incoming: VecDeque<Scripted>,
    pub outgoing: Vec<Envelope>,
    pub connects: Vec<ConnectRequest>,
    pub disconnects: usize,
}

/// Mock transport for testing without real sockets.
///
/// Cloning shares state, so a test can keep a handle after moving the
/// transport into a manager.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    pub state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&self, envelope: Envelope) {
        self.state
            .lock()
            .unwrap()
            .incoming
            .push_back(Scripted::Frame(envelope));
    }

    pub fn push_close(&self) {
        self.state.lock().unwrap().incoming.push_back(Scripted::Close);
    }

    pub fn push_error(&self, error: TransportError) {
        self.state
            .lock()
            .unwrap()
            .incoming
            .push_back(Scripted::Error(error));
    }

    /// Make every unscripted connect fail with `error` (or succeed with `None`).
    pub fn fail_connects(&self, error: Option<TransportError>) {
        self.state.lock().unwrap().fail_connect = error;
    }

    pub fn script_connect(&self, result: TransportResult<Handshake>) {
        self.state.lock().unwrap().connect_script.push_back(result);
    }

    pub fn outgoing(&self) -> Vec<Envelope> {
        self.state.lock().unwrap().outgoing.clone()
    }

    pub fn connects(&self) -> Vec<ConnectRequest> {
        self.state.lock().unwrap().connects.clone()
    }

    pub fn connect_count(&self) -> usize {
        self.state.lock().unwrap().connects.len()
    }

    pub fn disconnect_count(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }
}

impl Transport for MockTransport {
    fn connect(
        &mut self,
        request: &ConnectRequest,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Handshake>> + Send + '_>> {
        let request = request.clone();
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.connects.push(request);
            let result = match state.connect_script.pop_front() {
                Some(result) => result,
                None => match &state.fail_connect {
                    Some(error) => Err(error.clone()),
                    None => Ok(Handshake {
                        session_id: Some("s1".to_string()),
                    }),
                },
            };
            state.connected = result.is_ok();
            result
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.connected = false;
            state.disconnects += 1;
            Ok(())
        })
    }

    fn send(
        &mut self,
        envelope: Envelope,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            if !state.connected {
                return Err(TransportError::ConnectionClosed);
            }
            state.outgoing.push(envelope);
            Ok(())
        })
    }

    fn recv(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Option<Envelope>>> + Send + '_>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let next = state.lock().unwrap().incoming.pop_front();
            match next {
                Some(Scripted::Frame(envelope)) => Ok(Some(envelope)),
                Some(Scripted::Close) => {
                    state.lock().unwrap().connected = false;
                    Ok(None)
                }
                Some(Scripted::Error(error)) => {
                    state.lock().unwrap().connected = false;
                    Err(error)
                }
                None => std::future::pending().await,
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }
}

/// One request as seen by [`HttpStub`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Debug, Default)]
struct StubState {
    requests: Vec<RecordedRequest>,
    statuses: VecDeque<u16>,
    default_status: u16,
}

/// Minimal HTTP/1.1 server on a loopback port.
///
/// Answers every request with the next scripted status (or the default)
/// and an `{}` body, recording what it received.
#[derive(Debug, Clone)]
pub struct HttpStub {
    pub base_url: String,
    state: Arc<Mutex<StubState>>,
}

impl HttpStub {
    pub async fn start(default_status: u16) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let state = Arc::new(Mutex::new(StubState {
            default_status,
            ..StubState::default()
        }));

        let shared = Arc::clone(&state);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let shared = Arc::clone(&shared);
                tokio::spawn(async move {
                    let _ = answer(stream, shared).await;
                });
            }
        });

        HttpStub { base_url, state }
    }

    pub fn script(&self, status: u16) {
        self.state.lock().unwrap().statuses.push_back(status);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

async fn answer(
    stream: tokio::net::TcpStream,
    state: Arc<Mutex<StubState>>,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream);

    let mut line = String::new();
    reader.read_line(&mut line).await?;
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).await?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            headers.push((name.trim().to_lowercase(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;

    let status = {
        let mut state = state.lock().unwrap();
        state.requests.push(RecordedRequest {
            method,
            path,
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
        let default_status = state.default_status;
        state.statuses.pop_front().unwrap_or(default_status)
    };

    let response = format!(
        "HTTP/1.1 {} STUB\r\ncontent-type: application/json\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{{}}",
        status
    );
    let mut stream = reader.into_inner();
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// Replay target that records writes and fails chosen local ids.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    pub written: Vec<PendingAction>,
    pub fail_ids: Vec<String>,
}

impl RecordingTarget {
    pub fn failing(ids: &[&str]) -> Self {
        RecordingTarget {
            written: Vec::new(),
            fail_ids: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn written_ids(&self) -> Vec<String> {
        self.written.iter().map(|a| a.local_id.clone()).collect()
    }
}

impl ReplayTarget for RecordingTarget {
    fn write<'a>(&'a mut self, action: &'a PendingAction) -> WriteFuture<'a> {
        Box::pin(async move {
            self.written.push(action.clone());
            if self.fail_ids.contains(&action.local_id) {
                Err(WriteError::new("HTTP 500"))
            } else {
                Ok(())
            }
        })
    }
}

/// In-process stand-in for the background agent.
#[derive(Debug, Clone)]
pub struct FakeAgent {
    pub caches: Vec<String>,
    pub allow_list: Vec<String>,
    pub requests: Arc<Mutex<Vec<AgentRequest>>>,
}

impl FakeAgent {
    pub fn with_caches(caches: &[&str], allow_list: &[&str]) -> Self {
        FakeAgent {
            caches: caches.iter().map(|s| s.to_string()).collect(),
            allow_list: allow_list.iter().map(|s| s.to_string()).collect(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<AgentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl AgentLink for FakeAgent {
    fn request(&mut self, request: AgentRequest) -> AgentFuture<'_> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.clone());
            Ok(match request {
                AgentRequest::Status => AgentResponse::Status(AgentStatus {
                    version: 2,
                    state: AgentState::Activated,
                    caches: self.caches.clone(),
                    allow_list: self.allow_list.clone(),
                    uptime_secs: 1,
                }),
                AgentRequest::ClearCache { cache_name } => {
                    let before = self.caches.len();
                    self.caches.retain(|c| *c != cache_name);
                    AgentResponse::Cleared {
                        deleted: self.caches.len() != before,
                    }
                }
                AgentRequest::Sync { .. } => AgentResponse::Synced { synced: 0, failed: 0 },
                _ => AgentResponse::Ok,
            })
        })
    }
}
