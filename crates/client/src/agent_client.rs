// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Control-channel client for the background agent.
//!
//! One request per connection: connect to the agent's socket, write a framed
//! request, read a framed response.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use tether_ipc::{framing, AgentRequest, AgentResponse, AgentStatus, SOCKET_NAME};
use tokio::net::UnixStream;

use crate::error::{Error, Result};

/// Timeout for one request/response exchange.
const TIMEOUT_SECS: u64 = 5;

pub type AgentFuture<'a> = Pin<Box<dyn Future<Output = Result<AgentResponse>> + Send + 'a>>;

/// Something that can answer agent control requests.
pub trait AgentLink: Send {
    fn request(&mut self, request: AgentRequest) -> AgentFuture<'_>;
}

#[derive(Debug, Clone)]
pub struct AgentClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl AgentClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        AgentClient {
            socket_path: socket_path.into(),
            timeout: Duration::from_secs(TIMEOUT_SECS),
        }
    }

    /// Client for the agent whose state lives in `state_dir`.
    pub fn in_state_dir(state_dir: &Path) -> Self {
        Self::new(state_dir.join(SOCKET_NAME))
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send one request. `AgentResponse::Error` becomes `Error::Agent`.
    pub async fn send(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let mut stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|_| Error::AgentUnavailable(self.socket_path.display().to_string()))?;

        let exchange = async {
            framing::write_message(&mut stream, request).await?;
            framing::read_message::<_, AgentResponse>(&mut stream).await
        };
        let response = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| Error::Agent(format!("no response within {}s", self.timeout.as_secs())))??;

        match response {
            AgentResponse::Error { message } => Err(Error::Agent(message)),
            other => Ok(other),
        }
    }

    pub async fn ping(&self) -> Result<()> {
        expect(self.send(&AgentRequest::Ping).await?, |r| {
            matches!(r, AgentResponse::Pong).then_some(())
        })
    }

    pub async fn status(&self) -> Result<AgentStatus> {
        expect(self.send(&AgentRequest::Status).await?, |r| match r {
            AgentResponse::Status(status) => Some(status),
            _ => None,
        })
    }
}

impl AgentLink for AgentClient {
    fn request(&mut self, request: AgentRequest) -> AgentFuture<'_> {
        Box::pin(async move { self.send(&request).await })
    }
}

/// Extract the expected variant or report what came back instead.
pub fn expect<T>(
    response: AgentResponse,
    pick: impl FnOnce(AgentResponse) -> Option<T>,
) -> Result<T> {
    let shown = format!("{:?}", response);
    pick(response).ok_or_else(|| Error::Agent(format!("unexpected response: {}", shown)))
}

#[cfg(test)]
#[path = "agent_client_tests.rs"]
mod tests;
