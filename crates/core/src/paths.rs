// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Where the client keeps its data.
//!
//! The background agent replays the same offline store as the client, so
//! both resolve its default location here.

use std::path::{Path, PathBuf};

/// Overrides the client data directory.
pub const DATA_DIR_VAR: &str = "TETHER_DIR";

/// Offline store filename within the data directory.
pub const OFFLINE_DB_NAME: &str = "offline.db";

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Client data directory: `TETHER_DIR`, then `$XDG_DATA_HOME/tether`,
/// then `~/.local/share/tether`.
pub fn default_data_dir() -> PathBuf {
    if let Some(dir) = var(DATA_DIR_VAR) {
        return PathBuf::from(dir);
    }
    if let Some(dir) = var("XDG_DATA_HOME") {
        return PathBuf::from(dir).join("tether");
    }
    dirs::home_dir()
        .map(|h| h.join(".local/share/tether"))
        .unwrap_or_else(|| PathBuf::from(".local/share/tether"))
}

pub fn offline_store_in(data_dir: &Path) -> PathBuf {
    data_dir.join(OFFLINE_DB_NAME)
}

/// The offline store a default client writes to.
pub fn default_offline_store() -> PathBuf {
    offline_store_in(&default_data_dir())
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
