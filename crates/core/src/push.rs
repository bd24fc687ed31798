// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push subscription types shared by the page and the background agent.

use serde::{Deserialize, Serialize};

/// Key material produced by the push service for one subscription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushKeys {
    pub p256dh: String,
    pub auth: String,
}

/// A push subscription, mirrored server-side.
///
/// Destroyed only by an explicit unsubscribe, never by a disconnect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushRegistration {
    pub endpoint: String,
    pub keys: PushKeys,
}

impl PushRegistration {
    pub fn new(
        endpoint: impl Into<String>,
        p256dh: impl Into<String>,
        auth: impl Into<String>,
    ) -> Self {
        PushRegistration {
            endpoint: endpoint.into(),
            keys: PushKeys {
                p256dh: p256dh.into(),
                auth: auth.into(),
            },
        }
    }
}
