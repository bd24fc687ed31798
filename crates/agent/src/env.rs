// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variables read by the agent daemon.

use std::path::PathBuf;

pub mod names {
    pub const TETHER_AGENT_STATE_DIR: &str = "TETHER_AGENT_STATE_DIR";
    pub const XDG_STATE_HOME: &str = "XDG_STATE_HOME";
}

/// Returns the value of `TETHER_AGENT_STATE_DIR` if set.
pub fn state_dir() -> Option<PathBuf> {
    std::env::var(names::TETHER_AGENT_STATE_DIR)
        .ok()
        .map(PathBuf::from)
}

/// Returns the value of `XDG_STATE_HOME` if set.
pub fn xdg_state_home() -> Option<PathBuf> {
    std::env::var(names::XDG_STATE_HOME).ok().map(PathBuf::from)
}

/// The daemon's state directory: explicit override, then XDG, then
/// `~/.local/state/tether`.
pub fn default_state_dir() -> PathBuf {
    if let Some(dir) = state_dir() {
        return dir;
    }
    if let Some(dir) = xdg_state_home() {
        return dir.join("tether");
    }
    dirs::home_dir()
        .map(|h| h.join(".local/state/tether"))
        .unwrap_or_else(|| PathBuf::from(".local/state/tether"))
}
