// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline queue and agent health at a glance.

use tether_ipc::AgentStatus;

use super::Context;
use crate::error::{Error, Result};

/// Snapshot printed by `tether status`.
#[derive(Debug)]
pub struct Report {
    pub pending: usize,
    /// True if the durable store could not be opened.
    pub degraded: bool,
    pub has_token: bool,
    pub agent: Result<AgentStatus>,
}

pub async fn collect(ctx: &Context) -> Result<Report> {
    let queue = ctx.open_queue()?;
    Ok(Report {
        pending: queue.pending_count()?,
        degraded: queue.degraded(),
        has_token: queue.auth_token()?.is_some(),
        agent: ctx.agent().status().await,
    })
}

pub fn render(report: &Report) -> String {
    let store = if report.degraded {
        "in-memory (changes are lost on exit)"
    } else {
        "durable"
    };
    let agent = match &report.agent {
        Ok(status) => format!("{} (v{})", status.state, status.version),
        Err(Error::AgentUnavailable(_)) => "not running".to_string(),
        Err(e) => format!("error ({})", e),
    };
    format!(
        "Pending: {}\nStore: {}\nToken: {}\nAgent: {}",
        report.pending,
        store,
        if report.has_token { "saved" } else { "none" },
        agent
    )
}

pub async fn run(ctx: &Context) -> Result<()> {
    println!("{}", render(&collect(ctx).await?));
    Ok(())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
