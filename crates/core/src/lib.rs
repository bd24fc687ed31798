// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tether-core: Shared library for the tether client layer
//!
//! This crate provides the pending action model, the durable offline store,
//! the session protocol frames, and the replay loop used by both the page
//! context (tether) and the background agent (tether-agent).

pub mod action;
pub mod error;
pub mod id;
pub mod paths;
pub mod protocol;
pub mod push;
pub mod replay;
pub mod store;

pub use action::{ActionKind, PendingAction, SyncStatus};
pub use error::{Error, Result};
pub use protocol::{ClientEvent, Envelope, MessageSent};
pub use push::{PushKeys, PushRegistration};
pub use replay::{
    replay_pending, ActionQueue, QueueFuture, ReplayReport, ReplayTarget, WriteError, WriteFuture,
};
pub use store::OfflineStore;
