// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background replay through the agent's own network capability.

use tether_core::{PendingAction, ReplayTarget, WriteError, WriteFuture};

use crate::network::{Method, Network, Request};

pub use tether_ipc::SYNC_TAG;

/// Posts each pending action to its endpoint with the stored bearer token.
pub struct NetworkReplay<'n, N: Network + ?Sized> {
    network: &'n N,
    token: Option<String>,
}

impl<'n, N: Network + ?Sized> NetworkReplay<'n, N> {
    pub fn new(network: &'n N, token: Option<String>) -> Self {
        NetworkReplay { network, token }
    }
}

impl<N: Network + ?Sized> ReplayTarget for NetworkReplay<'_, N> {
    fn write<'a>(&'a mut self, action: &'a PendingAction) -> WriteFuture<'a> {
        Box::pin(async move {
            let endpoint = action.kind.endpoint().ok_or_else(|| {
                WriteError::new(format!("{} actions are local-only", action.kind))
            })?;
            let request = Request::json(Method::Post, endpoint, &action.payload)
                .map_err(|e| WriteError::new(e.to_string()))?
                .with_bearer(self.token.as_deref());

            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| WriteError::new(e.to_string()))?;
            if response.is_success() {
                Ok(())
            } else {
                Err(WriteError::new(format!("HTTP {}", response.status)))
            }
        })
    }
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
