// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription registry: event name → ordered listeners.
//!
//! Delivery is synchronous and in registration order. Each listener call is
//! isolated: an error return or a panic is logged and the remaining
//! listeners still run.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

/// Error a listener may return; logged, never propagated.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

pub type ListenerResult = Result<(), ListenerError>;

/// A subscribed callback. Identity is the `Arc` allocation.
pub type Listener = Arc<dyn Fn(&Value) -> ListenerResult + Send + Sync>;

/// Wrap a closure as a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Value) -> ListenerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Default)]
pub struct Registry {
    listeners: HashMap<String, Vec<Listener>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `event`. Registering the same listener twice
    /// is a no-op.
    pub fn on(&mut self, event: &str, listener: Listener) {
        let entry = self.listeners.entry(event.to_string()).or_default();
        if !entry.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            entry.push(listener);
        }
    }

    /// Remove `listener` from `event`. Returns true if it was registered.
    pub fn off(&mut self, event: &str, listener: &Listener) -> bool {
        let Some(entry) = self.listeners.get_mut(event) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|l| !Arc::ptr_eq(l, listener));
        let removed = entry.len() != before;
        if entry.is_empty() {
            self.listeners.remove(event);
        }
        removed
    }

    /// Invoke every listener for `event`. Returns how many succeeded.
    pub fn emit(&self, event: &str, data: &Value) -> usize {
        let Some(entry) = self.listeners.get(event) else {
            return 0;
        };

        let mut delivered = 0;
        for (index, listener) in entry.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| listener(data))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    tracing::warn!(event, index, error = %e, "listener failed");
                }
                Err(panic) => {
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::warn!(event, index, panic = %message, "listener panicked");
                }
            }
        }
        delivered
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, Vec::len)
    }

    /// Remove every listener for `event`.
    pub fn clear(&mut self, event: &str) {
        self.listeners.remove(event);
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
