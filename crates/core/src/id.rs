// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::action::ActionKind;

/// Generate a local action ID from kind, payload, and timestamp.
/// Format: {kind}-{hash} where hash is first 8 hex chars of SHA256(payload + timestamp)
pub fn generate_local_id(
    kind: ActionKind,
    payload: &serde_json::Value,
    created_at: &DateTime<Utc>,
) -> String {
    let input = format!("{}{}", payload, created_at.to_rfc3339());
    let hash = Sha256::digest(input.as_bytes());
    let short_hash = hex::encode(&hash[..4]);
    format!("{}-{}", kind.as_str(), short_hash)
}

/// Generate a unique local ID, appending an incrementing suffix on collision.
pub fn generate_unique_local_id<F>(
    kind: ActionKind,
    payload: &serde_json::Value,
    created_at: &DateTime<Utc>,
    exists: F,
) -> String
where
    F: Fn(&str) -> bool,
{
    let base_id = generate_local_id(kind, payload, created_at);

    if !exists(&base_id) {
        return base_id;
    }

    let mut suffix = 2;
    loop {
        let id = format!("{}-{}", base_id, suffix);
        if !exists(&id) {
            return id;
        }
        suffix += 1;
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
