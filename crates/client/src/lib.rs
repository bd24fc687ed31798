// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tether - real-time session and offline resilience for the social client.
//!
//! # Main Components
//!
//! - [`ConnectionManager`] - one authenticated session, reconnecting with
//!   bounded exponential backoff
//! - [`Registry`] - event name to listener dispatch
//! - [`OfflineQueue`] - durable store of writes made while offline
//! - [`SyncOrchestrator`] - replays the queue when connectivity returns
//! - [`AgentClient`] - control channel to the background agent (`tether-agentd`)
//!
//! # Usage
//!
//! ```rust,ignore
//! use tether::{ConnectionConfig, ConnectionManager, OfflineQueue, SyncOrchestrator};
//!
//! let queue = OfflineQueue::open(&path)?.into_shared();
//! let mut manager = ConnectionManager::new(ConnectionConfig::default());
//! manager.attach_queue(queue.clone());
//! manager.on("new_message", tether::registry::listener(|data| {
//!     println!("{}", data);
//!     Ok(())
//! }));
//! manager.connect(&token, &user_id).await?;
//! manager.run().await;
//! ```

pub mod agent_client;
pub mod api;
mod cli;
mod commands;
pub mod config;
pub mod connection;
pub mod env;
pub mod error;
pub mod offline;
pub mod registry;
pub mod status;
pub mod sync;
pub mod transport;

#[cfg(test)]
mod test_helpers;

pub use agent_client::{AgentClient, AgentLink};
pub use api::{ApiClient, ApiError};
pub use cli::{AgentCommand, AuthArgs, Cli, Command, OutputFormat};
pub use config::ClientConfig;
pub use connection::{Activity, ConnectionConfig, ConnectionManager, ConnectionState, Session};
pub use error::{Error, Result};
pub use offline::{OfflineQueue, SharedQueue};
pub use registry::{Listener, Registry};
pub use status::StatusIndicator;
pub use sync::{HttpReplay, SessionReplay, SyncOrchestrator, SyncStatus};
pub use transport::{Transport, TransportError, WebSocketTransport};

use commands::Context;

/// Execute a CLI command against the data directory `data_dir`
/// (or the default one).
pub async fn run(command: Command, data_dir: Option<std::path::PathBuf>) -> Result<()> {
    let ctx = Context::load(data_dir)?;
    match command {
        Command::Enqueue { kind, payload } => commands::queue::run_enqueue(&ctx, kind, &payload),
        Command::Pending { output } => commands::queue::run_pending(&ctx, output),
        Command::Sync { auth } => commands::sync::run(&ctx, &auth).await,
        Command::Listen { auth, events } => {
            commands::session::run_listen(&ctx, &auth, &events).await
        }
        Command::Send {
            to,
            content,
            conversation,
            auth,
        } => {
            commands::session::run_send(&ctx, &to, &content, conversation.as_deref(), &auth)
                .await
        }
        Command::Status => commands::status::run(&ctx).await,
        Command::Agent(command) => commands::agent::run(&ctx, &command).await,
    }
}
