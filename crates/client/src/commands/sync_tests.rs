// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use tempfile::TempDir;
use tether_core::ActionKind;

use super::*;
use crate::commands::queue;
use crate::test_helpers::HttpStub;

fn context(dir: &TempDir, api_base: &str) -> Context {
    let mut ctx = Context::load(Some(dir.path().to_path_buf())).unwrap();
    ctx.config.api_base = api_base.to_string();
    ctx.config.agent_state_dir = Some(dir.path().join("agent"));
    ctx
}

#[tokio::test]
async fn replays_queue_with_token() {
    let dir = TempDir::new().unwrap();
    let server = HttpStub::start(201).await;
    let ctx = context(&dir, &server.base_url);
    queue::enqueue(&ctx, ActionKind::Post, r#"{"text":"hi"}"#).unwrap();
    queue::enqueue(&ctx, ActionKind::Draft, r#"{"text":"later"}"#).unwrap();

    let auth = AuthArgs {
        token: Some("tok".to_string()),
        user: None,
    };
    let report = replay(&ctx, &auth).await.unwrap();

    assert_eq!(summary(&report), "synced 1, failed 0, skipped 1");
    assert_eq!(server.paths(), vec!["/api/posts"]);
    assert_eq!(
        server.requests()[0].header("authorization"),
        Some("Bearer tok")
    );
    assert_eq!(queue::pending(&ctx).unwrap().len(), 1);
}

#[tokio::test]
async fn server_errors_keep_actions_queued() {
    let dir = TempDir::new().unwrap();
    let server = HttpStub::start(500).await;
    let ctx = context(&dir, &server.base_url);
    let id = queue::enqueue(&ctx, ActionKind::Message, r#"{"recipientId":"u2","content":"x"}"#)
        .unwrap();

    let report = replay(&ctx, &AuthArgs::default()).await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, id);
    let pending = queue::pending(&ctx).unwrap();
    assert_eq!(pending[0].attempts, 1);
}

#[test]
fn summary_counts_every_outcome() {
    let report = ReplayReport {
        synced: vec!["post-1".to_string(), "post-2".to_string()],
        failed: vec![("message-1".to_string(), "HTTP 500".to_string())],
        skipped: 3,
    };
    assert_eq!(summary(&report), "synced 2, failed 1, skipped 3");
}
