// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The background network agent.
//!
//! An [`Agent`] moves through `parsed → installing → installed →
//! activating → activated`. Install precaches the static manifest; a failed
//! precache makes the agent redundant. Activation deletes every cache name
//! outside the current generation's allow-list. Only an activated agent
//! intercepts fetches.

use std::time::Instant;

use serde_json::Value;
use tether_core::store::AUTH_TOKEN_KEY;
use tether_core::{replay_pending, OfflineStore, PushRegistration, ReplayReport};
use tether_ipc::{AgentRequest, AgentResponse, AgentState, AgentStatus, ClientNotice};

use crate::config::AgentConfig;
use crate::error::{Error, Result};
use crate::fetch;
use crate::network::{Method, Network, Request, Response};
use crate::push::{self, ClientWindows, LogNotifier, NoWindows, NotificationDescriptor, Notifier};
use crate::replay::{NetworkReplay, SYNC_TAG};
use crate::routes::{Generation, RouteTable};
use crate::storage::AgentStore;

/// Server path mirroring the push registration.
pub const PUSH_SUBSCRIBE_PATH: &str = "/api/push/subscribe";

pub struct Agent<N: Network> {
    config: AgentConfig,
    routes: RouteTable,
    state: AgentState,
    storage: AgentStore,
    network: N,
    offline_store: Option<OfflineStore>,
    notifier: Box<dyn Notifier>,
    windows: Box<dyn ClientWindows>,
    started_at: Instant,
}

impl<N: Network> Agent<N> {
    pub fn new(config: AgentConfig, storage: AgentStore, network: N) -> Self {
        let routes = RouteTable::new(Generation::new(config.version))
            .with_routes(config.routes.iter().cloned());
        Agent {
            config,
            routes,
            state: AgentState::Parsed,
            storage,
            network,
            offline_store: None,
            notifier: Box::new(LogNotifier),
            windows: Box::new(NoWindows),
            started_at: Instant::now(),
        }
    }

    /// Attach the shared offline store used for background replay.
    pub fn with_offline_store(mut self, store: OfflineStore) -> Self {
        self.offline_store = Some(store);
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_windows(mut self, windows: Box<dyn ClientWindows>) -> Self {
        self.windows = windows;
        self
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn generation(&self) -> Generation {
        self.routes.generation()
    }

    pub fn storage(&self) -> &AgentStore {
        &self.storage
    }

    fn transition(&mut self, to: AgentState) {
        tracing::info!(from = %self.state, to = %to, "agent state");
        self.state = to;
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Precache the static manifest into the generation's static cache.
    pub async fn install(&mut self) -> Result<()> {
        if self.state != AgentState::Parsed {
            return Err(Error::InvalidState {
                action: "install",
                state: self.state,
            });
        }
        self.transition(AgentState::Installing);

        let cache_name = self.generation().static_cache();
        let manifest = self.config.static_manifest.clone();
        for path in manifest {
            if let Err(e) = self.precache(&cache_name, &path).await {
                tracing::error!(path, error = %e, "precache failed");
                self.transition(AgentState::Redundant);
                return Err(e);
            }
        }

        self.transition(AgentState::Installed);
        Ok(())
    }

    async fn precache(&mut self, cache_name: &str, path: &str) -> Result<()> {
        let response = self
            .network
            .fetch(&Request::get(path))
            .await
            .map_err(|e| Error::Install {
                url: path.to_string(),
                reason: e.to_string(),
            })?;
        if !response.is_success() {
            return Err(Error::Install {
                url: path.to_string(),
                reason: format!("HTTP {}", response.status),
            });
        }
        self.storage.put(cache_name, path, &response)
    }

    /// Activate an installed agent. Returns the deleted cache names.
    pub async fn activate(&mut self) -> Result<Vec<String>> {
        match self.state {
            AgentState::Installed => {}
            AgentState::Activated => return Ok(Vec::new()),
            state => {
                return Err(Error::InvalidState {
                    action: "activate",
                    state,
                })
            }
        }
        self.transition(AgentState::Activating);

        let generation = self.generation();
        let mut deleted = Vec::new();
        for name in self.storage.cache_names()? {
            if !generation.allows(&name) {
                self.storage.delete_cache(&name)?;
                tracing::info!(cache = %name, "deleted stale cache");
                deleted.push(name);
            }
        }
        for name in generation.allow_list() {
            self.storage.create_cache(&name)?;
        }

        self.transition(AgentState::Activated);
        Ok(deleted)
    }

    /// Activate without waiting for existing clients to close.
    pub async fn skip_waiting(&mut self) -> Result<Vec<String>> {
        self.activate().await
    }

    /// Install, then activate at once if `skip_waiting`.
    ///
    /// A failed precache leaves the agent redundant but still serving: it
    /// passes fetches through and keeps answering control requests. Only
    /// local storage failures are returned.
    pub async fn start(&mut self, skip_waiting: bool) -> Result<()> {
        match self.install().await {
            Ok(()) => {}
            Err(e @ Error::Install { .. }) => {
                tracing::warn!(error = %e, "serving without precached shell");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
        if skip_waiting {
            self.skip_waiting().await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Fetch interception
    // ------------------------------------------------------------------

    /// Answer a request the way an intercepting agent would.
    ///
    /// Before activation, and for every non-GET request, the request goes to
    /// the network untouched.
    pub async fn handle_fetch(&mut self, request: &Request) -> Result<Response> {
        if !self.state.is_active() || request.method != Method::Get {
            return Ok(self.network.fetch(request).await?);
        }

        let entry = self.routes.resolve(request);
        if request.is_navigation() {
            fetch::navigate(&mut self.storage, &self.network, &entry, request).await
        } else {
            fetch::respond(&mut self.storage, &self.network, &entry, request).await
        }
    }

    /// Fetch `urls` into the dynamic cache. Returns the URLs that failed.
    pub async fn cache_urls(&mut self, urls: &[String]) -> Result<(usize, Vec<String>)> {
        let cache_name = self.generation().dynamic_cache();
        let mut cached = 0;
        let mut failed = Vec::new();
        for url in urls {
            match self.network.fetch(&Request::get(url.as_str())).await {
                Ok(response) if response.is_success() => {
                    self.storage.put(&cache_name, url, &response)?;
                    cached += 1;
                }
                Ok(response) => {
                    tracing::warn!(url, status = response.status, "not caching");
                    failed.push(url.clone());
                }
                Err(e) => {
                    tracing::warn!(url, error = %e, "not caching");
                    failed.push(url.clone());
                }
            }
        }
        Ok((cached, failed))
    }

    pub fn clear_cache(&mut self, cache_name: &str) -> Result<bool> {
        let deleted = self.storage.delete_cache(cache_name)?;
        if deleted {
            tracing::info!(cache = cache_name, "cleared cache");
        }
        Ok(deleted)
    }

    pub fn status(&self) -> Result<AgentStatus> {
        Ok(AgentStatus {
            version: self.config.version,
            state: self.state,
            caches: self.storage.cache_names()?,
            allow_list: self.generation().allow_list(),
            uptime_secs: self.started_at.elapsed().as_secs(),
        })
    }

    // ------------------------------------------------------------------
    // Push
    // ------------------------------------------------------------------

    /// Show a notification for a push payload.
    pub fn on_push(&mut self, payload: &[u8]) -> NotificationDescriptor {
        let notification = push::notification_for(payload);
        self.notifier.show(&notification);
        notification
    }

    /// Route a notification click. Returns the URL navigated to.
    pub fn on_notification_click(&mut self, data: &Value, action: Option<&str>) -> Option<String> {
        push::route_click(self.windows.as_mut(), data, action)
    }

    fn auth_token(&self) -> Result<Option<String>> {
        match &self.offline_store {
            Some(store) => Ok(store.setting(AUTH_TOKEN_KEY)?),
            None => Ok(None),
        }
    }

    /// Store the registration locally and mirror it to the server.
    ///
    /// The local copy is kept even if the server rejects it.
    pub async fn subscribe_push(&mut self, registration: &PushRegistration) -> Result<()> {
        self.storage.save_push_registration(registration)?;

        let body = serde_json::to_value(registration)?;
        let request = Request::json(Method::Post, PUSH_SUBSCRIBE_PATH, &body)?
            .with_bearer(self.auth_token()?.as_deref());
        let response = self.network.fetch(&request).await?;
        if !response.is_success() {
            return Err(Error::PushRejected(response.status));
        }
        tracing::info!(endpoint = %registration.endpoint, "push subscription registered");
        Ok(())
    }

    /// Remove the registration locally and on the server.
    ///
    /// Returns false if there was no registration.
    pub async fn unsubscribe_push(&mut self) -> Result<bool> {
        let Some(registration) = self.storage.delete_push_registration()? else {
            return Ok(false);
        };

        let body = serde_json::json!({ "endpoint": registration.endpoint });
        let request = Request::json(Method::Delete, PUSH_SUBSCRIBE_PATH, &body)?
            .with_bearer(self.auth_token()?.as_deref());
        let response = self.network.fetch(&request).await?;
        if !response.is_success() {
            tracing::warn!(status = response.status, "server kept push subscription");
        }
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Background replay
    // ------------------------------------------------------------------

    /// Replay pending actions for a background sync tag.
    pub async fn on_sync(&mut self, tag: &str) -> Result<ReplayReport> {
        if tag != SYNC_TAG {
            tracing::debug!(tag, "ignoring unknown sync tag");
            return Ok(ReplayReport::default());
        }
        let token = self.auth_token()?;
        let stale_after = i64::try_from(self.config.stale_claim_secs)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .ok_or_else(|| {
                Error::Config(format!(
                    "stale_claim_secs out of range: {}",
                    self.config.stale_claim_secs
                ))
            })?;
        let store = self.offline_store.as_mut().ok_or(Error::NoOfflineStore)?;

        let released = store.release_stale_claims(stale_after)?;
        if released > 0 {
            tracing::info!(released, "released stale claims");
        }

        let mut target = NetworkReplay::new(&self.network, token);
        let report = replay_pending(store, &mut target).await?;
        tracing::info!(
            synced = report.synced.len(),
            failed = report.failed.len(),
            skipped = report.skipped,
            "background replay finished"
        );

        let notice = ClientNotice::SyncComplete {
            synced: report.synced.len(),
            failed: report.failed.len(),
        };
        for id in self.windows.list() {
            self.windows.post(id, &notice);
        }
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Control channel
    // ------------------------------------------------------------------

    /// Handle one control-channel request.
    pub async fn handle_request(&mut self, request: AgentRequest) -> AgentResponse {
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "request failed");
                AgentResponse::Error {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn dispatch(&mut self, request: AgentRequest) -> Result<AgentResponse> {
        Ok(match request {
            AgentRequest::SkipWaiting => {
                self.skip_waiting().await?;
                AgentResponse::Ok
            }
            AgentRequest::CacheUrls { urls } => {
                let (cached, failed) = self.cache_urls(&urls).await?;
                AgentResponse::Cached { cached, failed }
            }
            AgentRequest::ClearCache { cache_name } => AgentResponse::Cleared {
                deleted: self.clear_cache(&cache_name)?,
            },
            AgentRequest::Status => AgentResponse::Status(self.status()?),
            AgentRequest::Sync { tag } => {
                let report = self.on_sync(&tag).await?;
                AgentResponse::Synced {
                    synced: report.synced.len(),
                    failed: report.failed.len(),
                }
            }
            AgentRequest::Push { payload } => AgentResponse::Notified {
                title: self.on_push(payload.as_bytes()).title,
            },
            AgentRequest::NotificationClick { data, action } => AgentResponse::Clicked {
                url: self.on_notification_click(&data, action.as_deref()),
            },
            AgentRequest::SubscribePush { registration } => {
                self.subscribe_push(&registration).await?;
                AgentResponse::Ok
            }
            AgentRequest::UnsubscribePush => {
                self.unsubscribe_push().await?;
                AgentResponse::Ok
            }
            AgentRequest::Ping => AgentResponse::Pong,
            AgentRequest::Shutdown => AgentResponse::ShuttingDown,
        })
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
