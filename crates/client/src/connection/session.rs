// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// State of the real-time session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected, and not trying to be.
    Disconnected,
    /// First connection attempt in flight.
    Connecting,
    /// Session open.
    Connected,
    /// Waiting out a backoff delay or retrying after a drop.
    Reconnecting,
    /// Retries exhausted; only a manual reconnect resumes.
    Failed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub state: ConnectionState,
    pub session_id: Option<String>,
    /// Consecutive failed reconnection attempts. Reset on successful connect.
    pub reconnect_attempts: u32,
    pub last_error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            state: ConnectionState::Disconnected,
            session_id: None,
            reconnect_attempts: 0,
            last_error: None,
        }
    }
}
