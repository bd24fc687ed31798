// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Control channel between the page context and the background agent.
//!
//! This crate defines the message types and framing protocol used between
//! the `tether` client and the `tether-agentd` background agent. The two
//! contexts share no memory; everything crosses this channel (or the durable
//! offline store). Messages are serialized as JSON with length-prefixed
//! framing.

use std::fmt;

use serde::{Deserialize, Serialize};
use tether_core::PushRegistration;

/// Socket filename within the agent's state directory.
pub const SOCKET_NAME: &str = "agent.sock";

/// Sync tag the page registers when it goes offline with pending actions.
pub const SYNC_TAG: &str = "sync-pending-actions";

// ============================================================================
// Lifecycle
// ============================================================================

/// Lifecycle state of the background agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Constructed, not yet installed.
    Parsed,
    /// Precaching the static asset manifest.
    Installing,
    /// Installed, waiting for activation.
    Installed,
    /// Deleting cache generations outside the allow-list.
    Activating,
    /// Intercepting requests.
    Activated,
    /// Failed to install or superseded by a newer version.
    Redundant,
}

impl AgentState {
    /// Returns the string representation used in logs and status output.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentState::Parsed => "parsed",
            AgentState::Installing => "installing",
            AgentState::Installed => "installed",
            AgentState::Activating => "activating",
            AgentState::Activated => "activated",
            AgentState::Redundant => "redundant",
        }
    }

    /// Returns true if fetches are intercepted in this state.
    pub fn is_active(&self) -> bool {
        *self == AgentState::Activated
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Protocol types
// ============================================================================

/// Request sent from the page to the agent.
///
/// Wire shape: `{"type": "CACHE_URLS", "data": {"urls": [...]}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentRequest {
    /// Activate a waiting agent immediately.
    SkipWaiting,
    /// Fetch and store the given URLs in the dynamic cache.
    CacheUrls { urls: Vec<String> },
    /// Delete a named cache.
    #[serde(rename_all = "camelCase")]
    ClearCache { cache_name: String },
    /// Get agent status.
    Status,
    /// Connectivity regained: run the background replay for `tag`.
    Sync { tag: String },
    /// Deliver a raw push payload.
    Push { payload: String },
    /// The user clicked a notification (or one of its actions).
    NotificationClick {
        data: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action: Option<String>,
    },
    /// Store a push registration and mirror it to the server.
    SubscribePush { registration: PushRegistration },
    /// Remove the push registration locally and on the server.
    UnsubscribePush,
    /// Ping to check if the agent is alive.
    Ping,
    /// Graceful shutdown.
    Shutdown,
}

/// Response sent from the agent to the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentResponse {
    /// Request handled.
    Ok,
    /// Status response.
    Status(AgentStatus),
    /// Result of a `CACHE_URLS` request.
    Cached { cached: usize, failed: Vec<String> },
    /// Result of a `CLEAR_CACHE` request.
    Cleared { deleted: bool },
    /// Result of a background replay.
    Synced { synced: usize, failed: usize },
    /// A notification was shown.
    Notified { title: String },
    /// Where a notification click navigated, if anywhere.
    Clicked { url: Option<String> },
    /// Pong response.
    Pong,
    /// Shutdown acknowledged.
    ShuttingDown,
    /// Error response.
    Error { message: String },
}

/// Agent status information.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatus {
    /// Deployed agent version (cache generation).
    pub version: u32,
    /// Current lifecycle state.
    pub state: AgentState,
    /// Every cache name currently stored.
    pub caches: Vec<String>,
    /// Cache names belonging to the current generation.
    pub allow_list: Vec<String>,
    /// Uptime in seconds.
    pub uptime_secs: u64,
}

impl AgentStatus {
    /// Cache names not in the current generation's allow-list.
    pub fn stale_caches(&self) -> Vec<String> {
        self.caches
            .iter()
            .filter(|name| !self.allow_list.contains(name))
            .cloned()
            .collect()
    }
}

/// Instruction posted by the agent to an open client window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientNotice {
    /// Navigate the window to `url`.
    Navigate { url: String },
    /// A background replay finished.
    SyncComplete { synced: usize, failed: usize },
}

// ============================================================================
// Message framing
// ============================================================================

/// IPC message framing over tokio streams.
///
/// Messages are framed as:
/// - 4 bytes: message length (big-endian u32)
/// - N bytes: JSON-encoded message
pub mod framing {
    use serde::de::DeserializeOwned;
    use serde::Serialize;
    use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

    /// Maximum message size (1MB) to prevent malformed messages from causing hangs.
    pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

    /// Write a serializable message to the given async writer.
    pub async fn write_message<W, T>(writer: &mut W, message: &T) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
        T: Serialize,
    {
        let json = serde_json::to_vec(message)
            .map_err(|e| std::io::Error::other(format!("serialize error: {}", e)))?;
        let len =
            u32::try_from(json.len()).map_err(|_| std::io::Error::other("message too large"))?;
        writer.write_all(&len.to_be_bytes()).await?;
        writer.write_all(&json).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Read a deserializable message from the given async reader.
    pub async fn read_message<R, T>(reader: &mut R) -> std::io::Result<T>
    where
        R: AsyncRead + Unpin,
        T: DeserializeOwned,
    {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf).await?;
        let len = u32::from_be_bytes(len_buf) as usize;

        if len > MAX_MESSAGE_SIZE {
            return Err(std::io::Error::other(format!(
                "message too large: {} bytes (max {})",
                len, MAX_MESSAGE_SIZE
            )));
        }

        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf).await?;

        serde_json::from_slice(&buf)
            .map_err(|e| std::io::Error::other(format!("deserialize error: {}", e)))
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
