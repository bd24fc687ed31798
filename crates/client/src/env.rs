// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.

use std::path::PathBuf;

pub mod names {
    pub const TETHER_DIR: &str = tether_core::paths::DATA_DIR_VAR;
    pub const TETHER_TOKEN: &str = "TETHER_TOKEN";
    pub const TETHER_USER_ID: &str = "TETHER_USER_ID";
    pub const TETHER_AGENT_STATE_DIR: &str = "TETHER_AGENT_STATE_DIR";
    pub const XDG_DATA_HOME: &str = "XDG_DATA_HOME";
    pub const XDG_STATE_HOME: &str = "XDG_STATE_HOME";
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Returns the value of `TETHER_TOKEN` if set.
pub fn token() -> Option<String> {
    var(names::TETHER_TOKEN)
}

/// Returns the value of `TETHER_USER_ID` if set.
pub fn user_id() -> Option<String> {
    var(names::TETHER_USER_ID)
}

/// Returns the value of `TETHER_AGENT_STATE_DIR` if set.
pub fn agent_state_dir() -> Option<PathBuf> {
    var(names::TETHER_AGENT_STATE_DIR).map(PathBuf::from)
}

/// Client data directory: `TETHER_DIR`, then `$XDG_DATA_HOME/tether`,
/// then `~/.local/share/tether`. The agent resolves the same directory.
pub fn default_data_dir() -> PathBuf {
    tether_core::paths::default_data_dir()
}

/// Where the background agent keeps its socket.
pub fn default_agent_state_dir() -> PathBuf {
    if let Some(dir) = agent_state_dir() {
        return dir;
    }
    if let Some(dir) = var(names::XDG_STATE_HOME) {
        return PathBuf::from(dir).join("tether");
    }
    dirs::home_dir()
        .map(|h| h.join(".local/state/tether"))
        .unwrap_or_else(|| PathBuf::from(".local/state/tether"))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
