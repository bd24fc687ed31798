// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Foreground replay of the offline queue.

use tether_core::ReplayReport;

use super::{resolve_token, Context};
use crate::api::ApiClient;
use crate::cli::AuthArgs;
use crate::error::Result;
use crate::sync::{HttpReplay, SyncOrchestrator};

/// One-line outcome of a replay cycle.
pub fn summary(report: &ReplayReport) -> String {
    format!(
        "synced {}, failed {}, skipped {}",
        report.synced.len(),
        report.failed.len(),
        report.skipped
    )
}

/// Replay everything pending over HTTP.
pub async fn replay(ctx: &Context, auth: &AuthArgs) -> Result<ReplayReport> {
    let queue = ctx.open_queue()?;
    let token = resolve_token(auth, &queue)?;
    if token.is_none() {
        tracing::warn!("no session token, replaying unauthenticated");
    }

    let orchestrator = SyncOrchestrator::new(queue.into_shared())
        .with_display_delay(ctx.config.sync_display_delay())
        .with_agent(Box::new(ctx.agent()));
    let api = ApiClient::new(&ctx.config.api_base).with_token(token);
    orchestrator.on_online(&mut HttpReplay::new(api)).await
}

pub async fn run(ctx: &Context, auth: &AuthArgs) -> Result<()> {
    let report = replay(ctx, auth).await?;
    println!("{}", summary(&report));
    for (id, reason) in &report.failed {
        println!("  {}: {}", id, reason);
    }
    Ok(())
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
