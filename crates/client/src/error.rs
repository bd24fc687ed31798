// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::api::ApiError;
use crate::transport::TransportError;

/// All possible errors surfaced by the tether client.
///
/// Transport failures during reconnection are reported as status events,
/// not returned; callers see them only from explicit `connect` calls.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not connected\n  hint: call connect() first, or enqueue the action for later")]
    NotConnected,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("no acknowledgment for message {temp_id} within {timeout_ms}ms")]
    AckTimeout { temp_id: String, timeout_ms: u64 },

    #[error("send_message requires a tempId")]
    MissingTempId,

    #[error(transparent)]
    Store(#[from] tether_core::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("agent not running at {0}\n  hint: start it with `tether-agentd`")]
    AgentUnavailable(String),

    #[error("agent error: {0}")]
    Agent(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for tether client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
