// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The agent's own SQLite database: named response caches and the push
//! registration.
//!
//! This database belongs to the agent alone. Pending actions live in the
//! shared offline store, not here.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tether_core::PushRegistration;

use crate::error::Result;
use crate::network::Response;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS caches (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cache_entries (
    cache_name TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    headers TEXT NOT NULL,
    body BLOB NOT NULL,
    stored_at TEXT NOT NULL,
    PRIMARY KEY (cache_name, url)
);

CREATE INDEX IF NOT EXISTS idx_cache_entries_url ON cache_entries(url);

-- At most one registration per agent
CREATE TABLE IF NOT EXISTS push_subscription (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    endpoint TEXT NOT NULL,
    p256dh TEXT NOT NULL,
    auth TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

pub struct AgentStore {
    conn: Connection,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

impl AgentStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(AgentStore { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(AgentStore { conn })
    }

    /// Every cache name, sorted.
    pub fn cache_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM caches ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn has_cache(&self, name: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM caches WHERE name = ?1", [name], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    /// Create a named cache if it does not exist.
    pub fn create_cache(&mut self, name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
            params![name, now()],
        )?;
        Ok(())
    }

    /// Delete a named cache and its entries. Returns false if it did not exist.
    pub fn delete_cache(&mut self, name: &str) -> Result<bool> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM cache_entries WHERE cache_name = ?1", [name])?;
        let deleted = tx.execute("DELETE FROM caches WHERE name = ?1", [name])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Store a response under `url`, replacing any previous entry.
    pub fn put(&mut self, cache_name: &str, url: &str, response: &Response) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
            params![cache_name, now()],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO cache_entries
                 (cache_name, url, status, headers, body, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                cache_name,
                url,
                response.status,
                serde_json::to_string(&response.headers)?,
                response.body,
                now(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Look up `url` in one cache.
    pub fn lookup(&self, cache_name: &str, url: &str) -> Result<Option<Response>> {
        self.query_response(
            "SELECT status, headers, body FROM cache_entries
             WHERE cache_name = ?1 AND url = ?2",
            params![cache_name, url],
        )
    }

    /// Look up `url` in every cache, most recently stored first.
    pub fn lookup_any(&self, url: &str) -> Result<Option<Response>> {
        self.query_response(
            "SELECT status, headers, body FROM cache_entries
             WHERE url = ?1 ORDER BY stored_at DESC LIMIT 1",
            params![url],
        )
    }

    fn query_response(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Option<Response>> {
        let row: Option<(u16, String, Vec<u8>)> = self
            .conn
            .query_row(sql, params, |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .optional()?;

        match row {
            Some((status, headers, body)) => Ok(Some(Response {
                status,
                headers: serde_json::from_str(&headers)?,
                body,
            })),
            None => Ok(None),
        }
    }

    pub fn entry_count(&self, cache_name: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM cache_entries WHERE cache_name = ?1",
            [cache_name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn save_push_registration(&mut self, registration: &PushRegistration) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO push_subscription (id, endpoint, p256dh, auth, created_at)
             VALUES (1, ?1, ?2, ?3, ?4)",
            params![
                registration.endpoint,
                registration.keys.p256dh,
                registration.keys.auth,
                now(),
            ],
        )?;
        Ok(())
    }

    pub fn push_registration(&self) -> Result<Option<PushRegistration>> {
        let registration = self
            .conn
            .query_row(
                "SELECT endpoint, p256dh, auth FROM push_subscription WHERE id = 1",
                [],
                |row| {
                    Ok(PushRegistration::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        Ok(registration)
    }

    /// Returns the removed registration, if there was one.
    pub fn delete_push_registration(&mut self) -> Result<Option<PushRegistration>> {
        let existing = self.push_registration()?;
        if existing.is_some() {
            self.conn
                .execute("DELETE FROM push_subscription WHERE id = 1", [])?;
        }
        Ok(existing)
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
