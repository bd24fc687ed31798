// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tether_core::{
    replay_pending, ActionKind, ActionQueue, PendingAction, QueueFuture, ReplayReport,
    ReplayTarget,
};
use tether_ipc::{AgentRequest, AgentResponse, SYNC_TAG};
use tokio::sync::{watch, Mutex};

use crate::agent_client::{expect, AgentLink};
use crate::error::Result;
use crate::offline::SharedQueue;

/// How long `Synced`/`Error` stays visible before returning to `Idle`.
pub const DEFAULT_DISPLAY_DELAY: Duration = Duration::from_secs(3);

/// Claims older than this are assumed to belong to a crashed replay.
const STALE_CLAIM_SECS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    Syncing,
    Synced,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Drives replay of the offline queue and publishes its progress.
pub struct SyncOrchestrator {
    queue: SharedQueue,
    status: Arc<watch::Sender<SyncStatus>>,
    /// Bumped per cycle so a stale reset timer cannot clobber a newer status.
    generation: Arc<AtomicU64>,
    display_delay: Duration,
    agent: Option<Mutex<Box<dyn AgentLink>>>,
}

impl SyncOrchestrator {
    pub fn new(queue: SharedQueue) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        SyncOrchestrator {
            queue,
            status: Arc::new(status),
            generation: Arc::new(AtomicU64::new(0)),
            display_delay: DEFAULT_DISPLAY_DELAY,
            agent: None,
        }
    }

    pub fn with_display_delay(mut self, delay: Duration) -> Self {
        self.display_delay = delay;
        self
    }

    /// Link the background agent for cache hygiene and delegated replay.
    pub fn with_agent(mut self, agent: Box<dyn AgentLink>) -> Self {
        self.agent = Some(Mutex::new(agent));
        self
    }

    pub fn status(&self) -> SyncStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn queue(&self) -> &SharedQueue {
        &self.queue
    }

    /// Record a write for later replay. Never touches the network.
    pub async fn enqueue(&self, kind: ActionKind, payload: Value) -> Result<String> {
        self.queue.lock().await.enqueue(kind, payload)
    }

    pub async fn pending_count(&self) -> Result<usize> {
        self.queue.lock().await.pending_count()
    }

    /// Connectivity is back: replay everything pending through `target`.
    ///
    /// Ends in `Synced` if every attempted write succeeded, `Error`
    /// otherwise; failed actions stay queued for the next cycle. The queue
    /// is only locked per record step, so enqueueing never waits on a write.
    pub async fn on_online<T>(&self, target: &mut T) -> Result<ReplayReport>
    where
        T: ReplayTarget + ?Sized,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.status.send_replace(SyncStatus::Syncing);

        let released = {
            let mut queue = self.queue.lock().await;
            queue
                .store_mut()
                .release_stale_claims(chrono::Duration::seconds(STALE_CLAIM_SECS))
        };
        match released {
            Ok(0) => {}
            Ok(released) => tracing::info!(released, "released stale claims"),
            Err(e) => tracing::warn!(error = %e, "could not release stale claims"),
        }
        let outcome = replay_pending(&mut LockPerStep(&self.queue), target).await;

        let report = match outcome {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "replay aborted");
                self.settle(generation, SyncStatus::Error);
                return Err(e.into());
            }
        };

        tracing::info!(
            synced = report.synced.len(),
            failed = report.failed.len(),
            skipped = report.skipped,
            "replay finished"
        );
        let status = if report.is_clean() {
            SyncStatus::Synced
        } else {
            SyncStatus::Error
        };
        self.settle(generation, status);

        self.tidy_agent_caches().await;
        Ok(report)
    }

    /// Ask the background agent to replay on its own.
    ///
    /// Used when the page is about to go away with actions still queued.
    pub async fn request_background_sync(&self) -> Result<(usize, usize)> {
        let Some(agent) = &self.agent else {
            return Err(crate::error::Error::AgentUnavailable(
                "no agent linked".to_string(),
            ));
        };
        let response = agent
            .lock()
            .await
            .request(AgentRequest::Sync {
                tag: SYNC_TAG.to_string(),
            })
            .await?;
        expect(response, |r| match r {
            AgentResponse::Synced { synced, failed } => Some((synced, failed)),
            _ => None,
        })
    }

    fn settle(&self, generation: u64, status: SyncStatus) {
        self.status.send_replace(status);

        let sender = Arc::clone(&self.status);
        let current = Arc::clone(&self.generation);
        let delay = self.display_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if current.load(Ordering::SeqCst) == generation {
                sender.send_replace(SyncStatus::Idle);
            }
        });
    }

    /// Delete agent caches left over from older generations.
    async fn tidy_agent_caches(&self) {
        let Some(agent) = &self.agent else {
            return;
        };
        let mut agent = agent.lock().await;

        let status = match agent.request(AgentRequest::Status).await {
            Ok(AgentResponse::Status(status)) => status,
            Ok(other) => {
                tracing::warn!(response = ?other, "unexpected agent status response");
                return;
            }
            Err(e) => {
                tracing::debug!(error = %e, "agent not reachable, skipping cache cleanup");
                return;
            }
        };

        for cache_name in status.stale_caches() {
            match agent
                .request(AgentRequest::ClearCache {
                    cache_name: cache_name.clone(),
                })
                .await
            {
                Ok(_) => tracing::info!(%cache_name, "cleared stale cache"),
                Err(e) => tracing::warn!(%cache_name, error = %e, "could not clear cache"),
            }
        }
    }
}

/// Replay access to the shared queue, taking the lock once per step.
struct LockPerStep<'q>(&'q SharedQueue);

impl ActionQueue for LockPerStep<'_> {
    fn drain(&mut self) -> QueueFuture<'_, Vec<PendingAction>> {
        Box::pin(async move { self.0.lock().await.store().drain() })
    }

    fn claim<'a>(&'a mut self, local_id: &'a str) -> QueueFuture<'a, bool> {
        Box::pin(async move { self.0.lock().await.store_mut().claim(local_id) })
    }

    fn mark_synced<'a>(&'a mut self, local_id: &'a str) -> QueueFuture<'a, bool> {
        Box::pin(async move { self.0.lock().await.store_mut().mark_synced(local_id) })
    }

    fn mark_failed<'a>(&'a mut self, local_id: &'a str, reason: &'a str) -> QueueFuture<'a, ()> {
        Box::pin(async move {
            self.0
                .lock()
                .await
                .store_mut()
                .mark_failed(local_id, reason)
        })
    }
}
