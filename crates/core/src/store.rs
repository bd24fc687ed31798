// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed durable offline store.
//!
//! The [`OfflineStore`] holds pending user actions (posts, messages, drafts)
//! and cached read-models (users, notifications). It is the only state shared
//! between the page context and the background agent, so every operation runs
//! in its own transaction and status changes are compare-and-set updates.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;

use crate::action::{ActionKind, PendingAction, SyncStatus};
use crate::error::{Error, Result};
use crate::id::generate_unique_local_id;

/// Settings key holding the bearer token shared with the background agent.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// SQL schema for the offline store.
pub const SCHEMA: &str = r#"
-- Pending actions, one table per kind
CREATE TABLE IF NOT EXISTS posts (
    local_id TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL,
    sync_status TEXT NOT NULL DEFAULT 'pending',
    last_error TEXT,
    attempts INTEGER NOT NULL DEFAULT 0,
    claimed_at TEXT
);

CREATE TABLE IF NOT EXISTS messages (
    local_id TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL,
    sync_status TEXT NOT NULL DEFAULT 'pending',
    last_error TEXT,
    attempts INTEGER NOT NULL DEFAULT 0,
    claimed_at TEXT
);

CREATE TABLE IF NOT EXISTS drafts (
    local_id TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL,
    sync_status TEXT NOT NULL DEFAULT 'pending',
    last_error TEXT,
    attempts INTEGER NOT NULL DEFAULT 0,
    claimed_at TEXT
);

-- Cached read-models
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    cached_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    cached_at TEXT NOT NULL
);

-- Key/value settings shared across contexts
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_posts_status ON posts(sync_status, created_at);
CREATE INDEX IF NOT EXISTS idx_messages_status ON messages(sync_status, created_at);
CREATE INDEX IF NOT EXISTS idx_drafts_status ON drafts(sync_status, created_at);
"#;

/// Fixed-width timestamp so lexical order in SQL matches chronological order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

/// Parse a JSON column from the database.
fn parse_json(
    value: &str,
    column: &str,
) -> std::result::Result<serde_json::Value, rusqlite::Error> {
    serde_json::from_str(value).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid JSON in column '{column}'"
            ))),
        )
    })
}

const ACTION_COLUMNS: &str = "local_id, payload, created_at, sync_status, last_error, attempts";

fn row_to_action(kind: ActionKind, row: &rusqlite::Row<'_>) -> rusqlite::Result<PendingAction> {
    let payload: String = row.get(1)?;
    let created_at: String = row.get(2)?;
    let status: String = row.get(3)?;
    Ok(PendingAction {
        local_id: row.get(0)?,
        kind,
        payload: parse_json(&payload, "payload")?,
        created_at: parse_timestamp(&created_at, "created_at")?,
        sync_status: parse_db(&status, "sync_status")?,
        last_error: row.get(4)?,
        attempts: row.get(5)?,
    })
}

/// Find which kind table holds the given local id.
fn find_kind(conn: &Connection, local_id: &str) -> Result<Option<ActionKind>> {
    for kind in ActionKind::ALL {
        let found: bool = conn.query_row(
            &format!(
                "SELECT COUNT(*) > 0 FROM {} WHERE local_id = ?1",
                kind.table()
            ),
            params![local_id],
            |row| row.get(0),
        )?;
        if found {
            return Ok(Some(kind));
        }
    }
    Ok(None)
}

/// Durable local store for pending actions and cached read-models.
pub struct OfflineStore {
    conn: Connection,
}

impl OfflineStore {
    /// Open or create a store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL + busy timeout so the page and the agent can share the file
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(OfflineStore { conn })
    }

    /// Open an in-memory store (tests and degraded best-effort mode).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(OfflineStore { conn })
    }

    /// Record a new pending action and return its local id.
    ///
    /// Never touches the network.
    pub fn enqueue(&mut self, kind: ActionKind, payload: serde_json::Value) -> Result<String> {
        if !payload.is_object() {
            return Err(Error::InvalidInput(format!(
                "{} payload must be a JSON object",
                kind
            )));
        }

        let created_at = Utc::now();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let local_id = generate_unique_local_id(kind, &payload, &created_at, |candidate| {
            find_kind(&tx, candidate).ok().flatten().is_some()
        });

        tx.execute(
            &format!(
                "INSERT INTO {} (local_id, payload, created_at, sync_status)
                 VALUES (?1, ?2, ?3, ?4)",
                kind.table()
            ),
            params![
                local_id,
                serde_json::to_string(&payload)?,
                format_timestamp(&created_at),
                SyncStatus::Pending.as_str(),
            ],
        )?;
        tx.commit()?;

        tracing::debug!(%local_id, %kind, "enqueued pending action");
        Ok(local_id)
    }

    /// All actions awaiting replay (pending or failed), oldest first.
    pub fn drain(&self) -> Result<Vec<PendingAction>> {
        let mut all = Vec::new();
        for kind in ActionKind::ALL {
            all.extend(self.drain_kind(kind)?);
        }
        // Stable sort keeps per-kind insertion order for equal timestamps
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    /// Actions of one kind awaiting replay, oldest first.
    pub fn drain_kind(&self, kind: ActionKind) -> Result<Vec<PendingAction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ACTION_COLUMNS} FROM {}
             WHERE sync_status IN ('pending', 'failed')
             ORDER BY created_at, rowid",
            kind.table()
        ))?;
        let actions = stmt
            .query_map([], |row| row_to_action(kind, row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(actions)
    }

    /// Get a single action by local id.
    pub fn get(&self, local_id: &str) -> Result<Option<PendingAction>> {
        let Some(kind) = find_kind(&self.conn, local_id)? else {
            return Ok(None);
        };
        let action = self
            .conn
            .query_row(
                &format!(
                    "SELECT {ACTION_COLUMNS} FROM {} WHERE local_id = ?1",
                    kind.table()
                ),
                params![local_id],
                |row| row_to_action(kind, row),
            )
            .optional()?;
        Ok(action)
    }

    /// Atomically move an action from pending/failed to syncing.
    ///
    /// Returns `false` if the record no longer exists (already synced) or is
    /// currently claimed by another replay path. Callers must skip the network
    /// write in that case.
    pub fn claim(&mut self, local_id: &str) -> Result<bool> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(kind) = find_kind(&tx, local_id)? else {
            return Ok(false);
        };
        let changed = tx.execute(
            &format!(
                "UPDATE {} SET sync_status = 'syncing', claimed_at = ?2
                 WHERE local_id = ?1 AND sync_status IN ('pending', 'failed')",
                kind.table()
            ),
            params![local_id, format_timestamp(&Utc::now())],
        )?;
        tx.commit()?;
        Ok(changed == 1)
    }

    /// Mark an action as acknowledged by the server.
    ///
    /// Synced records are deleted rather than retained. Returns `false` if the
    /// record was already gone.
    pub fn mark_synced(&mut self, local_id: &str) -> Result<bool> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(kind) = find_kind(&tx, local_id)? else {
            return Ok(false);
        };
        let deleted = tx.execute(
            &format!("DELETE FROM {} WHERE local_id = ?1", kind.table()),
            params![local_id],
        )?;
        tx.commit()?;
        tracing::debug!(%local_id, "pending action synced");
        Ok(deleted == 1)
    }

    /// Mark an action's replay as failed, leaving it for the next drain cycle.
    pub fn mark_failed(&mut self, local_id: &str, reason: &str) -> Result<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let kind = find_kind(&tx, local_id)?
            .ok_or_else(|| Error::ActionNotFound(local_id.to_string()))?;
        tx.execute(
            &format!(
                "UPDATE {} SET sync_status = 'failed', last_error = ?2,
                 attempts = attempts + 1, claimed_at = NULL
                 WHERE local_id = ?1",
                kind.table()
            ),
            params![local_id, reason],
        )?;
        tx.commit()?;
        tracing::debug!(%local_id, reason, "pending action failed");
        Ok(())
    }

    /// Return claims older than `older_than` to the failed state.
    ///
    /// Recovers records left in `syncing` by a context that died mid-write.
    pub fn release_stale_claims(&mut self, older_than: chrono::Duration) -> Result<usize> {
        let cutoff = format_timestamp(&(Utc::now() - older_than));
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut released = 0;
        for kind in ActionKind::ALL {
            released += tx.execute(
                &format!(
                    "UPDATE {} SET sync_status = 'failed',
                     last_error = 'claim expired', claimed_at = NULL
                     WHERE sync_status = 'syncing' AND claimed_at < ?1",
                    kind.table()
                ),
                params![cutoff],
            )?;
        }
        tx.commit()?;
        Ok(released)
    }

    /// Number of actions not yet acknowledged, in any state.
    pub fn len(&self) -> Result<usize> {
        let mut total = 0usize;
        for kind in ActionKind::ALL {
            let count: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", kind.table()),
                [],
                |row| row.get(0),
            )?;
            total += usize::try_from(count).unwrap_or(0);
        }
        Ok(total)
    }

    /// Check if no actions are held.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Number of actions `drain` would return.
    pub fn pending_count(&self) -> Result<usize> {
        let mut total = 0usize;
        for kind in ActionKind::ALL {
            let count: i64 = self.conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {} WHERE sync_status IN ('pending', 'failed')",
                    kind.table()
                ),
                [],
                |row| row.get(0),
            )?;
            total += usize::try_from(count).unwrap_or(0);
        }
        Ok(total)
    }

    /// Cache a user profile read-model.
    pub fn cache_user(&mut self, user_id: &str, data: &serde_json::Value) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (id, data, cached_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, cached_at = excluded.cached_at",
            params![
                user_id,
                serde_json::to_string(data)?,
                format_timestamp(&Utc::now())
            ],
        )?;
        Ok(())
    }

    /// Get a cached user profile.
    pub fn cached_user(&self, user_id: &str) -> Result<Option<serde_json::Value>> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM users WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        match data {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    /// Replace the cached notification list.
    ///
    /// Each notification must carry an `id` (string or number).
    pub fn cache_notifications(&mut self, notifications: &[serde_json::Value]) -> Result<()> {
        let cached_at = format_timestamp(&Utc::now());
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM notifications", [])?;
        for notification in notifications {
            let id = match notification.get("id") {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Number(n)) => n.to_string(),
                _ => {
                    return Err(Error::InvalidInput(
                        "cached notification is missing an id".to_string(),
                    ))
                }
            };
            tx.execute(
                "INSERT OR REPLACE INTO notifications (id, data, cached_at) VALUES (?1, ?2, ?3)",
                params![id, serde_json::to_string(notification)?, cached_at],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Get the cached notification list in the order it was stored.
    pub fn cached_notifications(&self) -> Result<Vec<serde_json::Value>> {
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM notifications ORDER BY rowid")?;
        let rows = stmt
            .query_map([], |row| {
                let data: String = row.get(0)?;
                parse_json(&data, "data")
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Store a setting shared across contexts.
    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Read a setting.
    pub fn setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Remove a setting. Returns true if it existed.
    pub fn remove_setting(&mut self, key: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(deleted == 1)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
