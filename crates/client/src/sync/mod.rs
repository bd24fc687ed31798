// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-to-online reconciliation.
//!
//! While offline, writes go to the durable queue through
//! [`SyncOrchestrator::enqueue`]. When connectivity returns,
//! [`SyncOrchestrator::on_online`] replays them through a [`ReplayTarget`]:
//!
//! - [`HttpReplay`] posts each action to its REST endpoint
//! - [`SessionReplay`] sends messages over the live session and waits for
//!   the server's acknowledgment, falling back to HTTP when offline
//!
//! [`ReplayTarget`]: tether_core::ReplayTarget

mod orchestrator;
mod replay;

pub use orchestrator::{SyncOrchestrator, SyncStatus, DEFAULT_DISPLAY_DELAY};
pub use replay::{HttpReplay, SessionReplay};
