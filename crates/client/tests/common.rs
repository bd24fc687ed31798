// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Shared across test binaries; not every binary uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// Nothing listens here, so connects fail immediately.
pub const CLOSED_PORT: u16 = 1;

/// `tether` isolated to `dir`, with no credentials inherited from the shell.
pub fn tether(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("tether");
    cmd.env("TETHER_DIR", dir)
        .env("TETHER_AGENT_STATE_DIR", dir.join("agent"))
        .env_remove("TETHER_TOKEN")
        .env_remove("TETHER_USER_ID")
        .env_remove("RUST_LOG");
    cmd
}

/// Point the client at servers that are not running.
pub fn write_offline_config(dir: &Path) {
    let config = format!(
        "server_url = \"ws://127.0.0.1:{port}/ws\"\napi_base = \"http://127.0.0.1:{port}\"\n",
        port = CLOSED_PORT
    );
    std::fs::write(dir.join("tether.toml"), config).unwrap();
}

/// Enqueue an action and return its local id.
pub fn enqueue(dir: &Path, kind: &str, payload: &str) -> String {
    let output = tether(dir)
        .args(["enqueue", kind, payload])
        .output()
        .unwrap();
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
