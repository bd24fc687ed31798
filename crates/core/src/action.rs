// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending action types for the offline queue.
//!
//! A [`PendingAction`] is a user write (post, message, draft) recorded locally
//! before the server has acknowledged it. Both replay paths (the in-page
//! sync orchestrator and the background agent) read and mutate these records
//! through the shared [`OfflineStore`](crate::store::OfflineStore).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The kind of user-generated write held in the offline queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// A new feed post.
    Post,
    /// A direct message.
    Message,
    /// A locally saved draft. Never replayed to the server.
    Draft,
}

impl ActionKind {
    /// All kinds, in table order.
    pub const ALL: [ActionKind; 3] = [ActionKind::Post, ActionKind::Message, ActionKind::Draft];

    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Post => "post",
            ActionKind::Message => "message",
            ActionKind::Draft => "draft",
        }
    }

    /// Name of the table holding records of this kind.
    pub fn table(&self) -> &'static str {
        match self {
            ActionKind::Post => "posts",
            ActionKind::Message => "messages",
            ActionKind::Draft => "drafts",
        }
    }

    /// HTTP endpoint used to replay this kind, if it is replayable at all.
    pub fn endpoint(&self) -> Option<&'static str> {
        match self {
            ActionKind::Post => Some("/api/posts"),
            ActionKind::Message => Some("/api/messages"),
            ActionKind::Draft => None,
        }
    }

    /// Returns true if records of this kind are sent to the server on reconnect.
    pub fn is_replayable(&self) -> bool {
        self.endpoint().is_some()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "post" => Ok(ActionKind::Post),
            "message" => Ok(ActionKind::Message),
            "draft" => Ok(ActionKind::Draft),
            _ => Err(Error::InvalidKind(s.to_string())),
        }
    }
}

/// Sync state of a pending action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Waiting for the next replay cycle.
    Pending,
    /// Claimed by a replay path; a network write is in flight.
    Syncing,
    /// Acknowledged by the server. Records are deleted on reaching this state,
    /// so it is only observed transiently.
    Synced,
    /// Last replay attempt failed; retried on the next cycle.
    Failed,
}

impl SyncStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Failed => "failed",
        }
    }

    /// Returns true if a record in this state should be picked up by `drain`.
    pub fn is_drainable(&self) -> bool {
        matches!(self, SyncStatus::Pending | SyncStatus::Failed)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SyncStatus::Pending),
            "syncing" => Ok(SyncStatus::Syncing),
            "synced" => Ok(SyncStatus::Synced),
            "failed" => Ok(SyncStatus::Failed),
            _ => Err(Error::InvalidSyncStatus(s.to_string())),
        }
    }
}

/// A locally durable record of a write not yet confirmed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAction {
    /// Client-generated id, stable across retries.
    pub local_id: String,
    pub kind: ActionKind,
    /// The request body sent on replay.
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub sync_status: SyncStatus,
    /// Reason recorded by the last failed attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Number of failed replay attempts so far.
    #[serde(default)]
    pub attempts: u32,
}

impl PendingAction {
    /// Creates a new pending action in the `pending` state.
    pub fn new(
        local_id: String,
        kind: ActionKind,
        payload: serde_json::Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        PendingAction {
            local_id,
            kind,
            payload,
            created_at,
            sync_status: SyncStatus::Pending,
            last_error: None,
            attempts: 0,
        }
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
