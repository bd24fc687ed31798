// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Drain-and-write loop shared by every replay path.
//!
//! The sync orchestrator and the background agent both call
//! [`replay_pending`] with their own [`ActionQueue`] and [`ReplayTarget`].
//! Each record is claimed in the store before its network write, so two
//! contexts replaying the same store never write the same record twice, and
//! a record that was already acknowledged is never written again.
//!
//! Queue access is one short step per record operation. Nothing holds the
//! queue while a write is in flight, so new actions can be enqueued during
//! a long replay.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use crate::action::{ActionKind, PendingAction};
use crate::error::Result;
use crate::store::OfflineStore;

/// Failure of a single replayed write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct WriteError(pub String);

impl WriteError {
    pub fn new(message: impl Into<String>) -> Self {
        WriteError(message.into())
    }
}

/// Future returned by [`ReplayTarget::write`].
pub type WriteFuture<'a> =
    Pin<Box<dyn Future<Output = std::result::Result<(), WriteError>> + Send + 'a>>;

/// Future returned by the [`ActionQueue`] steps.
pub type QueueFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// The store operations the replay loop performs, each one on its own.
pub trait ActionQueue {
    fn drain(&mut self) -> QueueFuture<'_, Vec<PendingAction>>;
    fn claim<'a>(&'a mut self, local_id: &'a str) -> QueueFuture<'a, bool>;
    fn mark_synced<'a>(&'a mut self, local_id: &'a str) -> QueueFuture<'a, bool>;
    fn mark_failed<'a>(&'a mut self, local_id: &'a str, reason: &'a str) -> QueueFuture<'a, ()>;
}

impl ActionQueue for OfflineStore {
    fn drain(&mut self) -> QueueFuture<'_, Vec<PendingAction>> {
        let drained = OfflineStore::drain(self);
        Box::pin(async move { drained })
    }

    fn claim<'a>(&'a mut self, local_id: &'a str) -> QueueFuture<'a, bool> {
        let claimed = OfflineStore::claim(self, local_id);
        Box::pin(async move { claimed })
    }

    fn mark_synced<'a>(&'a mut self, local_id: &'a str) -> QueueFuture<'a, bool> {
        let removed = OfflineStore::mark_synced(self, local_id);
        Box::pin(async move { removed })
    }

    fn mark_failed<'a>(&'a mut self, local_id: &'a str, reason: &'a str) -> QueueFuture<'a, ()> {
        let marked = OfflineStore::mark_failed(self, local_id, reason);
        Box::pin(async move { marked })
    }
}

/// Something able to deliver a pending action to the server.
pub trait ReplayTarget {
    /// Perform the network write for one action.
    fn write<'a>(&'a mut self, action: &'a PendingAction) -> WriteFuture<'a>;
}

/// Outcome of one replay cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Local ids acknowledged and removed from the store.
    pub synced: Vec<String>,
    /// Local ids whose write failed, with the recorded reason.
    pub failed: Vec<(String, String)>,
    /// Records not written this cycle (local-only, claimed elsewhere, or
    /// behind a failed record of the same kind).
    pub skipped: usize,
}

impl ReplayReport {
    /// Returns true if every attempted write succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Replay every drainable action through `target`, oldest first.
///
/// After a failure, later actions of the same kind are left pending so
/// replay order within a kind matches creation order.
pub async fn replay_pending<Q, T>(queue: &mut Q, target: &mut T) -> Result<ReplayReport>
where
    Q: ActionQueue + ?Sized,
    T: ReplayTarget + ?Sized,
{
    let mut report = ReplayReport::default();
    let mut blocked: HashSet<ActionKind> = HashSet::new();

    for action in queue.drain().await? {
        if !action.kind.is_replayable() || blocked.contains(&action.kind) {
            report.skipped += 1;
            continue;
        }

        if !queue.claim(&action.local_id).await? {
            tracing::debug!(local_id = %action.local_id, "skipping action claimed elsewhere");
            report.skipped += 1;
            continue;
        }

        match target.write(&action).await {
            Ok(()) => {
                queue.mark_synced(&action.local_id).await?;
                report.synced.push(action.local_id);
            }
            Err(e) => {
                tracing::warn!(local_id = %action.local_id, error = %e, "replay write failed");
                queue.mark_failed(&action.local_id, &e.0).await?;
                blocked.insert(action.kind);
                report.failed.push((action.local_id, e.0));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
