// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration, read from `tether.toml` in the data directory.
//!
//! Every field is optional; a missing file yields the defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::connection::ConnectionConfig;
use crate::error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "tether.toml";

pub use tether_core::paths::OFFLINE_DB_NAME;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Real-time session endpoint.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Origin of the REST API used for replay.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Offline store location; defaults to `offline.db` in the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline_store: Option<PathBuf>,
    /// State directory of the background agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_state_dir: Option<PathBuf>,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,
    /// How long a finished sync stays visible.
    #[serde(default = "default_sync_display_ms")]
    pub sync_display_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_true")]
    pub retry_on_auth_rejected: bool,
}

fn default_server_url() -> String {
    "ws://localhost:3000/ws".to_string()
}

fn default_api_base() -> String {
    "http://localhost:3000".to_string()
}

fn default_ack_timeout_ms() -> u64 {
    10_000
}

fn default_sync_display_ms() -> u64 {
    3_000
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        ReconnectConfig {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
            retry_on_auth_rejected: true,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server_url: default_server_url(),
            api_base: default_api_base(),
            offline_store: None,
            agent_state_dir: None,
            reconnect: ReconnectConfig::default(),
            ack_timeout_ms: default_ack_timeout_ms(),
            sync_display_ms: default_sync_display_ms(),
        }
    }
}

impl ClientConfig {
    /// Load `tether.toml` from `dir`, or the defaults if it does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(ClientConfig::default());
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::create_dir_all(dir)?;
        fs::write(dir.join(CONFIG_FILE_NAME), content)?;
        Ok(())
    }

    pub fn offline_store_path(&self, data_dir: &Path) -> PathBuf {
        self.offline_store
            .clone()
            .unwrap_or_else(|| tether_core::paths::offline_store_in(data_dir))
    }

    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig {
            url: self.server_url.clone(),
            base_delay: Duration::from_millis(self.reconnect.base_delay_ms),
            max_delay: Duration::from_millis(self.reconnect.max_delay_ms),
            max_attempts: self.reconnect.max_attempts,
            retry_on_auth_rejected: self.reconnect.retry_on_auth_rejected,
            ack_timeout: Duration::from_millis(self.ack_timeout_ms),
        }
    }

    pub fn sync_display_delay(&self) -> Duration {
        Duration::from_millis(self.sync_display_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
