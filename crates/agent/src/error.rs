// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the background agent.

use thiserror::Error;
use tether_ipc::AgentState;

use crate::network::NetworkError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("offline store error: {0}")]
    Store(#[from] tether_core::Error),

    #[error("cache storage error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("install failed: could not precache {url}: {reason}")]
    Install { url: String, reason: String },

    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: AgentState,
    },

    #[error("not cached: {0}")]
    NotCached(String),

    #[error("no offline store attached\n  hint: set `offline_store` in agent.toml")]
    NoOfflineStore,

    #[error("server rejected push subscription: HTTP {0}")]
    PushRejected(u16),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
