// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background agent control commands.

use tether_ipc::{AgentRequest, AgentResponse, AgentStatus, SYNC_TAG};

use super::Context;
use crate::cli::AgentCommand;
use crate::error::Result;

pub fn request_for(command: &AgentCommand) -> AgentRequest {
    match command {
        AgentCommand::Status => AgentRequest::Status,
        AgentCommand::Ping => AgentRequest::Ping,
        AgentCommand::SkipWaiting => AgentRequest::SkipWaiting,
        AgentCommand::Cache { urls } => AgentRequest::CacheUrls { urls: urls.clone() },
        AgentCommand::ClearCache { name } => AgentRequest::ClearCache {
            cache_name: name.clone(),
        },
        AgentCommand::Sync => AgentRequest::Sync {
            tag: SYNC_TAG.to_string(),
        },
        AgentCommand::Shutdown => AgentRequest::Shutdown,
    }
}

pub fn format_status(status: &AgentStatus) -> String {
    let mut out = format!(
        "Version: {}\nState: {}\nUptime: {}s\nCaches:",
        status.version, status.state, status.uptime_secs
    );
    if status.caches.is_empty() {
        out.push_str(" none");
    }
    for cache in &status.caches {
        let marker = if status.allow_list.contains(cache) {
            ""
        } else {
            " (stale)"
        };
        out.push_str(&format!("\n  {}{}", cache, marker));
    }
    out
}

/// Human-readable rendering of an agent response.
pub fn describe(response: &AgentResponse) -> String {
    match response {
        AgentResponse::Ok => "ok".to_string(),
        AgentResponse::Status(status) => format_status(status),
        AgentResponse::Cached { cached, failed } if failed.is_empty() => {
            format!("cached {}", cached)
        }
        AgentResponse::Cached { cached, failed } => {
            format!("cached {}, failed: {}", cached, failed.join(", "))
        }
        AgentResponse::Cleared { deleted: true } => "cache deleted".to_string(),
        AgentResponse::Cleared { deleted: false } => "no such cache".to_string(),
        AgentResponse::Synced { synced, failed } => {
            format!("synced {}, failed {}", synced, failed)
        }
        AgentResponse::Notified { title } => format!("notified: {}", title),
        AgentResponse::Clicked { url: Some(url) } => format!("opened {}", url),
        AgentResponse::Clicked { url: None } => "dismissed".to_string(),
        AgentResponse::Pong => "pong".to_string(),
        AgentResponse::ShuttingDown => "agent stopping".to_string(),
        AgentResponse::Error { message } => format!("error: {}", message),
    }
}

pub async fn run(ctx: &Context, command: &AgentCommand) -> Result<()> {
    let response = ctx.agent().send(&request_for(command)).await?;
    println!("{}", describe(&response));
    Ok(())
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
