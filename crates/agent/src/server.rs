// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Control-channel server.
//!
//! Requests are handled one at a time, in arrival order, so the agent never
//! sees two control messages interleave.

use std::time::Duration;

use tokio::net::{UnixListener, UnixStream};
use tether_ipc::{framing, AgentRequest, AgentResponse};

use crate::agent::Agent;
use crate::error::Result;
use crate::network::Network;

/// Time allowed for a client to send its request.
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Serve control requests until a `SHUTDOWN` request or Ctrl-C.
pub async fn serve<N: Network>(listener: UnixListener, agent: &mut Agent<N>) -> Result<()> {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _)) => {
                        if handle_connection(stream, agent).await? {
                            tracing::info!("shutting down");
                            return Ok(());
                        }
                    }
                    Err(e) => tracing::warn!("failed to accept connection: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, shutting down");
                return Ok(());
            }
        }
    }
}

/// Handle one request. Returns true if the agent should stop.
async fn handle_connection<N: Network>(
    mut stream: UnixStream,
    agent: &mut Agent<N>,
) -> Result<bool> {
    let request: AgentRequest =
        match tokio::time::timeout(READ_TIMEOUT, framing::read_message(&mut stream)).await {
            Ok(Ok(request)) => request,
            Ok(Err(e)) => {
                tracing::warn!("failed to read request: {}", e);
                return Ok(false);
            }
            Err(_) => {
                tracing::warn!("timed out waiting for request");
                return Ok(false);
            }
        };

    tracing::debug!(?request, "control request");
    let response = agent.handle_request(request).await;
    let shutdown = matches!(response, AgentResponse::ShuttingDown);
    if let Err(e) = framing::write_message(&mut stream, &response).await {
        tracing::warn!("failed to write response: {}", e);
    }
    Ok(shutdown)
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
