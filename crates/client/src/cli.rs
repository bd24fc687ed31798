// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tether_core::ActionKind;

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

const QUICKSTART_HELP: &str = "\
Get started:
  tether enqueue post '{\"text\":\"hello\"}'   Queue a post while offline
  tether pending                            Show what is waiting
  tether sync --token <t>                   Replay the queue over HTTP
  tether listen --token <t> --user <id>     Stream live session events";

#[derive(Parser, Debug)]
#[command(name = "tether", version)]
#[command(about = "Real-time session and offline queue for the social client")]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Data directory holding tether.toml and the offline store
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Session credentials; fall back to `TETHER_TOKEN` / `TETHER_USER_ID`.
#[derive(Args, Debug, Clone, Default)]
pub struct AuthArgs {
    /// Session token
    #[arg(long)]
    pub token: Option<String>,

    /// User id presented with the token
    #[arg(long)]
    pub user: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Queue a write for replay when back online
    Enqueue {
        /// post, message, or draft
        kind: ActionKind,
        /// JSON object body
        payload: String,
    },

    /// List queued actions
    Pending {
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Replay queued actions over HTTP
    Sync {
        #[command(flatten)]
        auth: AuthArgs,
    },

    /// Connect and print inbound session events as JSON lines
    Listen {
        #[command(flatten)]
        auth: AuthArgs,

        /// Only print these events (repeatable)
        #[arg(long = "event", short)]
        events: Vec<String>,
    },

    /// Send a direct message, queueing it if the session cannot be opened
    Send {
        /// Recipient user id
        #[arg(long)]
        to: String,

        content: String,

        #[arg(long)]
        conversation: Option<String>,

        #[command(flatten)]
        auth: AuthArgs,
    },

    /// Show queue and agent status
    Status,

    /// Control the background agent
    #[command(subcommand)]
    Agent(AgentCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum AgentCommand {
    /// Show lifecycle state and caches
    Status,
    /// Check the agent is alive
    Ping,
    /// Activate a waiting agent now
    SkipWaiting,
    /// Fetch URLs into the dynamic cache
    Cache {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Delete a named cache
    ClearCache { name: String },
    /// Run the background replay
    Sync,
    /// Stop the agent
    Shutdown,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
