// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for agent control channel types and framing.

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use yare::parameterized;

#[parameterized(
    skip_waiting = { AgentRequest::SkipWaiting },
    cache_urls = { AgentRequest::CacheUrls { urls: vec!["/static/app.js".to_string()] } },
    clear_cache = { AgentRequest::ClearCache { cache_name: "static-v1".to_string() } },
    status = { AgentRequest::Status },
    sync = { AgentRequest::Sync { tag: "sync-pending-actions".to_string() } },
    push = { AgentRequest::Push { payload: r#"{"title":"hi"}"#.to_string() } },
    click = { AgentRequest::NotificationClick { data: json!({"type": "message"}), action: None } },
    subscribe = { AgentRequest::SubscribePush {
        registration: PushRegistration::new("https://push.example/abc", "key", "secret"),
    } },
    unsubscribe = { AgentRequest::UnsubscribePush },
    ping = { AgentRequest::Ping },
    shutdown = { AgentRequest::Shutdown },
)]
fn agent_request_serialization(request: AgentRequest) {
    let json = serde_json::to_string(&request).unwrap();
    let parsed: AgentRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(request, parsed);
}

#[test]
fn control_messages_use_page_wire_shape() {
    assert_eq!(
        serde_json::to_value(AgentRequest::SkipWaiting).unwrap(),
        json!({"type": "SKIP_WAITING"})
    );
    assert_eq!(
        serde_json::to_value(AgentRequest::CacheUrls {
            urls: vec!["/a".to_string()]
        })
        .unwrap(),
        json!({"type": "CACHE_URLS", "data": {"urls": ["/a"]}})
    );
    assert_eq!(
        serde_json::to_value(AgentRequest::ClearCache {
            cache_name: "dynamic-v1".to_string()
        })
        .unwrap(),
        json!({"type": "CLEAR_CACHE", "data": {"cacheName": "dynamic-v1"}})
    );
}

#[test]
fn page_sent_json_parses() {
    let parsed: AgentRequest =
        serde_json::from_str(r#"{"type":"CLEAR_CACHE","data":{"cacheName":"static-v1"}}"#)
            .unwrap();
    assert_eq!(
        parsed,
        AgentRequest::ClearCache {
            cache_name: "static-v1".to_string()
        }
    );
}

fn status() -> AgentStatus {
    AgentStatus {
        version: 2,
        state: AgentState::Activated,
        caches: vec![
            "static-v1".to_string(),
            "static-v2".to_string(),
            "dynamic-v2".to_string(),
        ],
        allow_list: vec!["static-v2".to_string(), "dynamic-v2".to_string()],
        uptime_secs: 60,
    }
}

#[parameterized(
    ok = { AgentResponse::Ok },
    status = { AgentResponse::Status(super::status()) },
    cached = { AgentResponse::Cached { cached: 2, failed: vec!["/missing".to_string()] } },
    cleared = { AgentResponse::Cleared { deleted: true } },
    synced = { AgentResponse::Synced { synced: 3, failed: 1 } },
    notified = { AgentResponse::Notified { title: "New message".to_string() } },
    clicked = { AgentResponse::Clicked { url: Some("/posts/p1".to_string()) } },
    pong = { AgentResponse::Pong },
    shutting_down = { AgentResponse::ShuttingDown },
    error = { AgentResponse::Error { message: "boom".to_string() } },
)]
fn agent_response_serialization(response: AgentResponse) {
    let json = serde_json::to_string(&response).unwrap();
    let parsed: AgentResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(response, parsed);
}

#[test]
fn stale_caches_excludes_allow_list() {
    assert_eq!(status().stale_caches(), vec!["static-v1".to_string()]);
}

#[parameterized(
    parsed = { AgentState::Parsed, "parsed", false },
    installing = { AgentState::Installing, "installing", false },
    installed = { AgentState::Installed, "installed", false },
    activating = { AgentState::Activating, "activating", false },
    activated = { AgentState::Activated, "activated", true },
    redundant = { AgentState::Redundant, "redundant", false },
)]
fn agent_state_display(state: AgentState, expected: &str, active: bool) {
    assert_eq!(state.to_string(), expected);
    assert_eq!(state.is_active(), active);
}

#[test]
fn client_notice_navigate_shape() {
    assert_eq!(
        serde_json::to_value(ClientNotice::Navigate {
            url: "/messages/c1".to_string()
        })
        .unwrap(),
        json!({"type": "NAVIGATE", "data": {"url": "/messages/c1"}})
    );
}

#[tokio::test]
async fn framing_roundtrip() {
    let request = AgentRequest::CacheUrls {
        urls: vec!["/static/app.css".to_string(), "/static/app.js".to_string()],
    };

    let mut buf = Vec::new();
    framing::write_message(&mut buf, &request).await.unwrap();

    // 4-byte length prefix followed by JSON
    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    assert_eq!(len, buf.len() - 4);

    let parsed: AgentRequest = framing::read_message(&mut buf.as_slice()).await.unwrap();
    assert_eq!(request, parsed);
}

#[tokio::test]
async fn framing_rejects_oversized_message() {
    let len = (framing::MAX_MESSAGE_SIZE as u32) + 1;
    let bytes = len.to_be_bytes();
    let result: std::io::Result<AgentRequest> = framing::read_message(&mut &bytes[..]).await;
    assert!(result.unwrap_err().to_string().contains("too large"));
}

#[tokio::test]
async fn framing_rejects_truncated_body() {
    let bytes = [0, 0, 0, 10, b'{'];
    let result: std::io::Result<AgentRequest> = framing::read_message(&mut &bytes[..]).await;
    assert!(result.is_err());
}
