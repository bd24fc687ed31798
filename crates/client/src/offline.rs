// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Page-side handle on the offline store.
//!
//! Opening the on-disk store can fail (read-only home, corrupt file). The
//! queue then keeps working in memory and reports itself as degraded, so
//! callers never lose the ability to enqueue; they only lose durability.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tether_core::store::AUTH_TOKEN_KEY;
use tether_core::{ActionKind, OfflineStore, PendingAction};

use crate::error::Result;

/// Queue shared between the connection manager and the sync orchestrator.
pub type SharedQueue = Arc<tokio::sync::Mutex<OfflineQueue>>;

pub struct OfflineQueue {
    store: OfflineStore,
    degraded: bool,
}

impl OfflineQueue {
    /// Open the store at `path`, falling back to memory if that fails.
    pub fn open(path: &Path) -> Result<Self> {
        match OfflineStore::open(path) {
            Ok(store) => Ok(OfflineQueue {
                store,
                degraded: false,
            }),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "offline store unavailable, queueing in memory"
                );
                Ok(OfflineQueue {
                    store: OfflineStore::open_in_memory()?,
                    degraded: true,
                })
            }
        }
    }

    pub fn in_memory() -> Result<Self> {
        Ok(OfflineQueue {
            store: OfflineStore::open_in_memory()?,
            degraded: false,
        })
    }

    /// True when actions will not survive a restart.
    pub fn degraded(&self) -> bool {
        self.degraded
    }

    pub fn into_shared(self) -> SharedQueue {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    pub fn enqueue(&mut self, kind: ActionKind, payload: Value) -> Result<String> {
        Ok(self.store.enqueue(kind, payload)?)
    }

    pub fn drain(&self) -> Result<Vec<PendingAction>> {
        Ok(self.store.drain()?)
    }

    pub fn pending_count(&self) -> Result<usize> {
        Ok(self.store.pending_count()?)
    }

    /// Remember the session token so background replay can authenticate.
    pub fn set_auth_token(&mut self, token: &str) -> Result<()> {
        Ok(self.store.set_setting(AUTH_TOKEN_KEY, token)?)
    }

    pub fn auth_token(&self) -> Result<Option<String>> {
        Ok(self.store.setting(AUTH_TOKEN_KEY)?)
    }

    pub fn clear_auth_token(&mut self) -> Result<bool> {
        Ok(self.store.remove_setting(AUTH_TOKEN_KEY)?)
    }

    pub fn store(&self) -> &OfflineStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut OfflineStore {
        &mut self.store
    }
}

#[cfg(test)]
#[path = "offline_tests.rs"]
mod tests;
