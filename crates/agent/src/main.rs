// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tether-agentd - The background network agent daemon.
//!
//! Owns the response caches and push registration under its state
//! directory, replays the shared offline store on `SYNC`, and listens on a
//! Unix socket for control requests from `tether` processes.
//!
//! Usage:
//!   tether-agentd --state-dir <path>

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tether_agent::{env, server, Agent, AgentConfig, AgentStore, HttpNetwork};
use tether_core::OfflineStore;
use tether_ipc::SOCKET_NAME;
use tokio::net::UnixListener;

/// PID filename within the state directory.
const PID_NAME: &str = "agent.pid";
/// Lock filename for single instance guarantee.
const LOCK_NAME: &str = "agent.lock";
/// Log filename within the state directory.
const LOG_NAME: &str = "agent.log";
/// Cache database filename within the state directory.
const CACHE_DB_NAME: &str = "caches.db";

#[derive(Parser, Debug)]
#[command(name = "tether-agentd")]
#[command(about = "Background network agent for the tether client")]
struct Args {
    /// State directory for the socket, caches, and logs
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Activate immediately instead of waiting for SKIP_WAITING
    #[arg(long)]
    skip_waiting: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let state_dir = args.state_dir.unwrap_or_else(env::default_state_dir);

    if let Err(e) = fs::create_dir_all(&state_dir) {
        eprintln!("failed to create {}: {}", state_dir.display(), e);
        return ExitCode::FAILURE;
    }

    setup_logging(&state_dir.join(LOG_NAME));
    tracing::info!("tether-agentd starting, state_dir={}", state_dir.display());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(&state_dir, args.skip_waiting)) {
        Ok(()) => {
            tracing::info!("tether-agentd stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(state_dir: &Path, skip_waiting: bool) -> tether_agent::Result<()> {
    let lock_file = acquire_lock(&state_dir.join(LOCK_NAME))?;

    let pid_path = state_dir.join(PID_NAME);
    fs::write(&pid_path, std::process::id().to_string())?;

    let socket_path = state_dir.join(SOCKET_NAME);
    // Remove stale socket if it exists
    let _ = fs::remove_file(&socket_path);

    let result = serve(state_dir, &socket_path, skip_waiting).await;

    let _ = fs::remove_file(&pid_path);
    let _ = fs::remove_file(&socket_path);
    drop(lock_file);
    result
}

async fn serve(
    state_dir: &Path,
    socket_path: &Path,
    skip_waiting: bool,
) -> tether_agent::Result<()> {
    let config = AgentConfig::load(state_dir)?;
    let storage = AgentStore::open(&state_dir.join(CACHE_DB_NAME))?;
    let network = HttpNetwork::new(&config.api_base)?;

    let offline = match OfflineStore::open(&config.offline_store) {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!(
                path = %config.offline_store.display(),
                error = %e,
                "offline store unavailable, background sync disabled"
            );
            None
        }
    };
    let mut agent = Agent::new(config, storage, network);
    if let Some(store) = offline {
        agent = agent.with_offline_store(store);
    }

    let listener = UnixListener::bind(socket_path)?;
    tracing::info!("listening on {}", socket_path.display());

    agent.start(skip_waiting).await?;

    // Signal readiness to parent process
    println!("READY");
    let _ = std::io::stdout().flush();

    server::serve(listener, &mut agent).await
}

fn setup_logging(log_path: &Path) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Try to open log file, fall back to stderr
    if let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn acquire_lock(lock_path: &Path) -> std::io::Result<fs::File> {
    use fs2::FileExt;

    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(lock_path)?;
    file.try_lock_exclusive()
        .map_err(|_| std::io::Error::other("another agent instance is already running"))?;
    Ok(file)
}
