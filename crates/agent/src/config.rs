// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Agent configuration, read from `agent.toml` in the state directory.
//!
//! Every field is optional; a missing file yields the defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::routes::Route;

pub const CONFIG_FILE_NAME: &str = "agent.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Deployed cache generation; bump to retire old caches on activation.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Origin the agent fetches from.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Paths precached into the static cache at install.
    #[serde(default = "default_static_manifest")]
    pub static_manifest: Vec<String>,
    /// Extra routes matched before the built-in table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,
    /// Shared offline store used for background replay; defaults to the
    /// one a default client writes to.
    #[serde(default = "default_offline_store")]
    pub offline_store: PathBuf,
    /// Claims older than this are assumed abandoned by a crashed context.
    #[serde(default = "default_stale_claim_secs")]
    pub stale_claim_secs: u64,
}

fn default_version() -> u32 {
    1
}

fn default_api_base() -> String {
    "http://localhost:3000".to_string()
}

fn default_static_manifest() -> Vec<String> {
    ["/", "/manifest.json", "/favicon.ico", "/icons/icon-192x192.png"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_offline_store() -> PathBuf {
    tether_core::paths::default_offline_store()
}

fn default_stale_claim_secs() -> u64 {
    300
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            version: default_version(),
            api_base: default_api_base(),
            static_manifest: default_static_manifest(),
            routes: Vec::new(),
            offline_store: default_offline_store(),
            stale_claim_secs: default_stale_claim_secs(),
        }
    }
}

impl AgentConfig {
    /// Load `agent.toml` from `dir`, or the defaults if it does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(AgentConfig::default());
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(dir.join(CONFIG_FILE_NAME), content)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
