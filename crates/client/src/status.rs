// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Single user-facing status derived from connection and sync state.

use std::fmt;

use crate::connection::ConnectionState;
use crate::sync::SyncStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndicator {
    Reconnecting,
    Offline,
    Syncing,
    Synced,
    Error,
}

impl StatusIndicator {
    /// What to show, or `None` when everything is healthy and idle.
    ///
    /// Sync progress wins over connection state so the user sees the
    /// outcome of a replay even if the session drops again right after.
    pub fn from_states(connection: ConnectionState, sync: SyncStatus) -> Option<Self> {
        match sync {
            SyncStatus::Syncing => return Some(StatusIndicator::Syncing),
            SyncStatus::Synced => return Some(StatusIndicator::Synced),
            SyncStatus::Error => return Some(StatusIndicator::Error),
            SyncStatus::Idle => {}
        }
        match connection {
            ConnectionState::Connected => None,
            ConnectionState::Connecting | ConnectionState::Reconnecting => {
                Some(StatusIndicator::Reconnecting)
            }
            ConnectionState::Disconnected | ConnectionState::Failed => {
                Some(StatusIndicator::Offline)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusIndicator::Reconnecting => "reconnecting",
            StatusIndicator::Offline => "offline",
            StatusIndicator::Syncing => "syncing",
            StatusIndicator::Synced => "synced",
            StatusIndicator::Error => "error",
        }
    }
}

impl fmt::Display for StatusIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
