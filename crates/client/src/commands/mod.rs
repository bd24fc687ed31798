// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod agent;
pub mod queue;
pub mod session;
pub mod status;
pub mod sync;

use std::path::PathBuf;

use crate::agent_client::AgentClient;
use crate::cli::AuthArgs;
use crate::config::ClientConfig;
use crate::env;
use crate::error::{Error, Result};
use crate::offline::OfflineQueue;

/// Everything a command needs from the environment.
pub struct Context {
    pub data_dir: PathBuf,
    pub config: ClientConfig,
}

impl Context {
    /// Resolve the data directory and load its config.
    pub fn load(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(env::default_data_dir);
        let config = ClientConfig::load(&data_dir)?;
        Ok(Context { data_dir, config })
    }

    pub fn open_queue(&self) -> Result<OfflineQueue> {
        OfflineQueue::open(&self.config.offline_store_path(&self.data_dir))
    }

    pub fn agent(&self) -> AgentClient {
        let state_dir = self
            .config
            .agent_state_dir
            .clone()
            .unwrap_or_else(env::default_agent_state_dir);
        AgentClient::in_state_dir(&state_dir)
    }
}

/// Token from the flag, the environment, or the last session.
pub fn resolve_token(auth: &AuthArgs, queue: &OfflineQueue) -> Result<Option<String>> {
    if let Some(token) = auth.token.clone().or_else(env::token) {
        return Ok(Some(token));
    }
    queue.auth_token()
}

pub fn require_token(auth: &AuthArgs, queue: &OfflineQueue) -> Result<String> {
    resolve_token(auth, queue)?.ok_or_else(|| {
        Error::InvalidInput(
            "no session token\n  hint: pass --token or set TETHER_TOKEN".to_string(),
        )
    })
}

pub fn require_user(auth: &AuthArgs) -> Result<String> {
    auth.user.clone().or_else(env::user_id).ok_or_else(|| {
        Error::InvalidInput("no user id\n  hint: pass --user or set TETHER_USER_ID".to_string())
    })
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
