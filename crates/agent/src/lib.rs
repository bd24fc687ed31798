// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tether-agent: the background network agent.
//!
//! Runs with its own lifecycle, independent of any page. It intercepts
//! fetches with per-route caching strategies, keeps versioned cache
//! generations, delivers push notifications, and replays pending actions
//! from the shared offline store when connectivity returns.

pub mod agent;
pub mod config;
pub mod env;
pub mod error;
pub mod fetch;
pub mod network;
pub mod offline;
pub mod push;
pub mod replay;
pub mod routes;
pub mod server;
pub mod storage;

#[cfg(test)]
mod test_helpers;

pub use agent::Agent;
pub use config::AgentConfig;
pub use error::{Error, Result};
pub use network::{HttpNetwork, Method, Network, NetworkError, Request, Response};
pub use push::{ClientWindows, NotificationDescriptor, Notifier, PushDeliveryError};
pub use routes::{CacheEntry, Generation, RouteTable, Strategy};
pub use storage::AgentStore;
