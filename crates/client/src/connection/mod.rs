// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Real-time session management.
//!
//! ```text
//! ┌───────────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ ConnectionManager │────►│  Transport  │────►│   Server    │
//! │                   │◄────│   (trait)   │◄────│             │
//! └───────────────────┘     └─────────────┘     └─────────────┘
//!        │ emit
//!        ▼
//! ┌─────────────┐
//! │  Registry   │  (event name → listeners)
//! └─────────────┘
//! ```
//!
//! Unexpected drops trigger reconnection with bounded exponential backoff.
//! After `max_attempts` consecutive failures the manager stops in
//! [`ConnectionState::Failed`] until [`ConnectionManager::reconnect`] is
//! called.

mod backoff;
mod manager;
mod session;

pub use backoff::Backoff;
pub use manager::{Activity, ConnectionConfig, ConnectionManager, MessageAck};
pub use session::{ConnectionState, Session};
