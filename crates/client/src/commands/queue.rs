// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::Value;
use tether_core::{ActionKind, PendingAction};

use super::Context;
use crate::cli::OutputFormat;
use crate::error::{Error, Result};

/// Parse `payload` and queue it; returns the local id.
pub fn enqueue(ctx: &Context, kind: ActionKind, payload: &str) -> Result<String> {
    let payload: Value = serde_json::from_str(payload)
        .map_err(|e| Error::InvalidInput(format!("payload is not valid JSON: {}", e)))?;
    let mut queue = ctx.open_queue()?;
    if queue.degraded() {
        eprintln!("warning: offline store unavailable, action will not survive a restart");
    }
    queue.enqueue(kind, payload)
}

pub fn run_enqueue(ctx: &Context, kind: ActionKind, payload: &str) -> Result<()> {
    println!("{}", enqueue(ctx, kind, payload)?);
    Ok(())
}

pub fn pending(ctx: &Context) -> Result<Vec<PendingAction>> {
    ctx.open_queue()?.drain()
}

pub fn format_line(action: &PendingAction) -> String {
    let mut line = format!(
        "{}  {}  attempts={}",
        action.local_id, action.sync_status, action.attempts
    );
    if let Some(error) = &action.last_error {
        line.push_str(&format!("  ({})", error));
    }
    line
}

pub fn run_pending(ctx: &Context, output: OutputFormat) -> Result<()> {
    let actions = pending(ctx)?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&actions)?),
        OutputFormat::Text if actions.is_empty() => println!("nothing pending"),
        OutputFormat::Text => {
            for action in &actions {
                println!("{}", format_line(action));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
