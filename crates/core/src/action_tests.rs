// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    post = { "post", ActionKind::Post },
    message = { "message", ActionKind::Message },
    draft = { "draft", ActionKind::Draft },
    post_upper = { "POST", ActionKind::Post },
    message_mixed = { "Message", ActionKind::Message },
)]
fn action_kind_from_str_valid(input: &str, expected: ActionKind) {
    assert_eq!(input.parse::<ActionKind>().unwrap(), expected);
}

#[parameterized(
    invalid = { "story" },
    empty = { "" },
)]
fn action_kind_from_str_invalid(input: &str) {
    assert!(matches!(
        input.parse::<ActionKind>(),
        Err(Error::InvalidKind(_))
    ));
}

#[parameterized(
    post = { ActionKind::Post, "posts", Some("/api/posts") },
    message = { ActionKind::Message, "messages", Some("/api/messages") },
    draft = { ActionKind::Draft, "drafts", None },
)]
fn action_kind_storage_and_endpoint(kind: ActionKind, table: &str, endpoint: Option<&str>) {
    assert_eq!(kind.table(), table);
    assert_eq!(kind.endpoint(), endpoint);
    assert_eq!(kind.is_replayable(), endpoint.is_some());
}

#[parameterized(
    pending = { "pending", SyncStatus::Pending, true },
    syncing = { "syncing", SyncStatus::Syncing, false },
    synced = { "synced", SyncStatus::Synced, false },
    failed = { "failed", SyncStatus::Failed, true },
)]
fn sync_status_parse_and_drainable(input: &str, expected: SyncStatus, drainable: bool) {
    let status = input.parse::<SyncStatus>().unwrap();
    assert_eq!(status, expected);
    assert_eq!(status.as_str(), input);
    assert_eq!(status.is_drainable(), drainable);
}

#[test]
fn sync_status_from_str_invalid() {
    assert!(matches!(
        "done".parse::<SyncStatus>(),
        Err(Error::InvalidSyncStatus(_))
    ));
}

#[test]
fn pending_action_new_starts_pending() {
    let action = PendingAction::new(
        "post-1a2b3c4d".to_string(),
        ActionKind::Post,
        serde_json::json!({"text": "hello"}),
        Utc::now(),
    );
    assert_eq!(action.sync_status, SyncStatus::Pending);
    assert_eq!(action.attempts, 0);
    assert!(action.last_error.is_none());
}

#[test]
fn pending_action_serializes_camel_case() {
    let action = PendingAction::new(
        "message-00ff00ff".to_string(),
        ActionKind::Message,
        serde_json::json!({"content": "hi"}),
        Utc::now(),
    );
    let json = serde_json::to_value(&action).unwrap();
    assert_eq!(json["localId"], "message-00ff00ff");
    assert_eq!(json["syncStatus"], "pending");
    assert!(json.get("lastError").is_none());
}
