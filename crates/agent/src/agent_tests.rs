// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::test_helpers::{FakeWindows, MockNetwork, RecordingNotifier};
use serde_json::json;
use tempfile::TempDir;
use tether_core::ActionKind;

fn config(version: u32) -> AgentConfig {
    AgentConfig {
        version,
        static_manifest: vec!["/".to_string(), "/manifest.json".to_string()],
        ..AgentConfig::default()
    }
}

fn serving_network() -> MockNetwork {
    let network = MockNetwork::new();
    network.respond_ok("/", "<html>shell</html>");
    network.respond_ok("/manifest.json", "{}");
    network
}

async fn activated(version: u32, network: MockNetwork) -> Agent<MockNetwork> {
    let mut agent = Agent::new(config(version), AgentStore::open_in_memory().unwrap(), network);
    agent.install().await.unwrap();
    agent.activate().await.unwrap();
    agent
}

#[tokio::test]
async fn install_precaches_manifest() {
    let network = serving_network();
    let mut agent = Agent::new(config(1), AgentStore::open_in_memory().unwrap(), network);
    assert_eq!(agent.state(), AgentState::Parsed);

    agent.install().await.unwrap();

    assert_eq!(agent.state(), AgentState::Installed);
    assert_eq!(agent.storage().entry_count("static-v1").unwrap(), 2);
}

#[tokio::test]
async fn failed_precache_makes_agent_redundant() {
    let network = MockNetwork::new();
    network.respond_ok("/", "<html></html>");
    // /manifest.json answers 404
    let mut agent = Agent::new(config(1), AgentStore::open_in_memory().unwrap(), network);

    let err = agent.install().await.unwrap_err();

    assert!(matches!(err, Error::Install { ref url, .. } if url == "/manifest.json"));
    assert_eq!(agent.state(), AgentState::Redundant);
    assert!(agent.activate().await.is_err());
}

#[tokio::test]
async fn start_with_skip_waiting_activates() {
    let mut agent = Agent::new(config(1), AgentStore::open_in_memory().unwrap(), serving_network());
    agent.start(true).await.unwrap();
    assert_eq!(agent.state(), AgentState::Activated);
}

#[tokio::test]
async fn unreachable_network_at_start_keeps_agent_serving() {
    let network = MockNetwork::new();
    network.set_offline(true);
    let mut offline = OfflineStore::open_in_memory().unwrap();
    offline.enqueue(ActionKind::Post, json!({"text": "queued"})).unwrap();
    let mut agent = Agent::new(config(1), AgentStore::open_in_memory().unwrap(), network.clone())
        .with_offline_store(offline);

    agent.start(true).await.unwrap();
    assert_eq!(agent.state(), AgentState::Redundant);

    let AgentResponse::Status(status) = agent.handle_request(AgentRequest::Status).await else {
        unreachable!("status is answered while redundant");
    };
    assert_eq!(status.state, AgentState::Redundant);

    let sync = AgentRequest::Sync {
        tag: SYNC_TAG.to_string(),
    };
    assert_eq!(
        agent.handle_request(sync.clone()).await,
        AgentResponse::Synced { synced: 0, failed: 1 }
    );

    network.set_offline(false);
    network.respond("/api/posts", Response::new(201, "{}"));
    assert_eq!(
        agent.handle_request(sync).await,
        AgentResponse::Synced { synced: 1, failed: 0 }
    );
}

#[tokio::test]
async fn activation_deletes_caches_outside_allow_list() {
    let mut storage = AgentStore::open_in_memory().unwrap();
    storage.put("static-v1", "/", &Response::new(200, "old")).unwrap();
    storage.create_cache("dynamic-v1").unwrap();
    storage.create_cache("static-v2").unwrap();

    let mut agent = Agent::new(config(2), storage, serving_network());
    agent.install().await.unwrap();
    let deleted = agent.skip_waiting().await.unwrap();

    assert_eq!(deleted, vec!["dynamic-v1".to_string(), "static-v1".to_string()]);
    assert_eq!(
        agent.storage().cache_names().unwrap(),
        vec!["dynamic-v2".to_string(), "static-v2".to_string()]
    );
    assert_eq!(agent.state(), AgentState::Activated);
}

#[tokio::test]
async fn activate_is_idempotent_once_active() {
    let mut agent = activated(1, serving_network()).await;
    assert!(agent.activate().await.unwrap().is_empty());
}

#[tokio::test]
async fn fetches_pass_through_before_activation() {
    let network = serving_network();
    let mut agent = Agent::new(config(1), AgentStore::open_in_memory().unwrap(), network.clone());
    network.respond_ok("/static/app.js", "js");

    agent.handle_fetch(&Request::get("/static/app.js")).await.unwrap();

    assert!(agent.storage().cache_names().unwrap().is_empty());
}

#[tokio::test]
async fn non_get_requests_are_not_intercepted() {
    let network = serving_network();
    network.respond("/api/posts", Response::new(201, "{}"));
    let mut agent = activated(1, network.clone()).await;

    let request = Request::json(Method::Post, "/api/posts", &json!({"text": "hi"})).unwrap();
    let response = agent.handle_fetch(&request).await.unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(agent.storage().entry_count("dynamic-v1").unwrap(), 0);
}

#[tokio::test]
async fn offline_navigation_serves_precached_shell() {
    let network = serving_network();
    let mut agent = activated(1, network.clone()).await;
    network.set_offline(true);

    let response = agent.handle_fetch(&Request::navigate("/messages/c1")).await.unwrap();

    assert_eq!(response.text(), "<html>shell</html>");
}

#[tokio::test]
async fn precached_assets_are_served_offline() {
    let network = serving_network();
    let mut agent = activated(1, network.clone()).await;
    network.set_offline(true);

    let response = agent.handle_fetch(&Request::get("/manifest.json")).await.unwrap();
    assert_eq!(response.text(), "{}");
}

#[tokio::test]
async fn cache_urls_reports_failures() {
    let network = serving_network();
    network.respond_ok("/api/users/profile/u1", "{}");
    let mut agent = activated(1, network).await;

    let response = agent
        .handle_request(AgentRequest::CacheUrls {
            urls: vec!["/api/users/profile/u1".to_string(), "/missing".to_string()],
        })
        .await;

    assert_eq!(
        response,
        AgentResponse::Cached {
            cached: 1,
            failed: vec!["/missing".to_string()]
        }
    );
}

#[tokio::test]
async fn clear_cache_and_status() {
    let mut agent = activated(1, serving_network()).await;
    agent.storage.create_cache("static-v0").unwrap();

    let AgentResponse::Status(status) = agent.handle_request(AgentRequest::Status).await else {
        unreachable!("expected status");
    };
    assert_eq!(status.stale_caches(), vec!["static-v0".to_string()]);

    let cleared = agent
        .handle_request(AgentRequest::ClearCache {
            cache_name: "static-v0".to_string(),
        })
        .await;
    assert_eq!(cleared, AgentResponse::Cleared { deleted: true });
}

#[tokio::test]
async fn push_shows_notification_and_default_on_garbage() {
    let notifier = RecordingNotifier::default();
    let mut agent = activated(1, serving_network())
        .await
        .with_notifier(Box::new(notifier.clone()));

    let response = agent
        .handle_request(AgentRequest::Push {
            payload: r#"{"title":"New follower"}"#.to_string(),
        })
        .await;
    agent.on_push(b"\x00\x01");

    assert_eq!(
        response,
        AgentResponse::Notified {
            title: "New follower".to_string()
        }
    );
    let shown = notifier.shown.lock().unwrap();
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[1], NotificationDescriptor::default());
}

#[tokio::test]
async fn notification_click_navigates_open_window() {
    let windows = FakeWindows::with_open(&[9]);
    let mut agent = activated(1, serving_network())
        .await
        .with_windows(Box::new(windows.clone()));

    let response = agent
        .handle_request(AgentRequest::NotificationClick {
            data: json!({"type": "friend_request", "userId": "u3"}),
            action: None,
        })
        .await;

    assert_eq!(
        response,
        AgentResponse::Clicked {
            url: Some("/profile/u3".to_string())
        }
    );
    assert_eq!(windows.state.lock().unwrap().posted.len(), 1);
}

#[tokio::test]
async fn push_subscription_is_stored_and_mirrored() {
    let network = serving_network();
    network.respond(PUSH_SUBSCRIBE_PATH, Response::new(201, ""));
    let mut offline = OfflineStore::open_in_memory().unwrap();
    offline.set_setting(AUTH_TOKEN_KEY, "tok").unwrap();
    let mut agent = activated(1, network.clone())
        .await
        .with_offline_store(offline);
    let registration = PushRegistration::new("https://push.example/1", "k", "a");

    agent.subscribe_push(&registration).await.unwrap();
    assert_eq!(
        agent.storage().push_registration().unwrap(),
        Some(registration)
    );

    assert!(agent.unsubscribe_push().await.unwrap());
    assert!(!agent.unsubscribe_push().await.unwrap());
    assert!(agent.storage().push_registration().unwrap().is_none());

    let calls: Vec<_> = network
        .requests()
        .into_iter()
        .filter(|r| r.path == PUSH_SUBSCRIBE_PATH)
        .collect();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].method, Method::Post);
    assert_eq!(calls[0].header("authorization"), Some("Bearer tok"));
    assert_eq!(calls[1].method, Method::Delete);
}

#[tokio::test]
async fn rejected_push_subscription_is_kept_locally() {
    let network = serving_network();
    network.respond(PUSH_SUBSCRIBE_PATH, Response::new(500, ""));
    let mut agent = activated(1, network).await;
    let registration = PushRegistration::new("https://push.example/1", "k", "a");

    let err = agent.subscribe_push(&registration).await.unwrap_err();

    assert!(matches!(err, Error::PushRejected(500)));
    assert!(agent.storage().push_registration().unwrap().is_some());
}

#[tokio::test]
async fn sync_without_offline_store_is_an_error() {
    let mut agent = activated(1, serving_network()).await;
    let err = agent.on_sync(SYNC_TAG).await.unwrap_err();
    assert!(matches!(err, Error::NoOfflineStore));
}

#[tokio::test]
async fn background_replay_is_idempotent_across_contexts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("offline.db");

    // Page context enqueues while offline
    let mut page = OfflineStore::open(&path).unwrap();
    page.set_setting(AUTH_TOKEN_KEY, "tok").unwrap();
    page.enqueue(ActionKind::Post, json!({"text": "from the train"}))
        .unwrap();

    let network = serving_network();
    network.respond("/api/posts", Response::new(201, "{}"));
    let windows = FakeWindows::with_open(&[1]);
    let mut agent = activated(1, network.clone())
        .await
        .with_offline_store(OfflineStore::open(&path).unwrap())
        .with_windows(Box::new(windows.clone()));

    let first = agent
        .handle_request(AgentRequest::Sync {
            tag: SYNC_TAG.to_string(),
        })
        .await;
    let second = agent.on_sync(SYNC_TAG).await.unwrap();

    assert_eq!(first, AgentResponse::Synced { synced: 1, failed: 0 });
    assert!(second.synced.is_empty());
    assert_eq!(network.request_count("/api/posts"), 1);
    assert!(page.is_empty().unwrap());
    assert!(windows
        .state
        .lock()
        .unwrap()
        .posted
        .contains(&(1, ClientNotice::SyncComplete { synced: 1, failed: 0 })));
}

#[tokio::test]
async fn out_of_range_claim_age_is_config_error() {
    let config = AgentConfig {
        stale_claim_secs: u64::MAX,
        ..config(1)
    };
    let mut agent = Agent::new(config, AgentStore::open_in_memory().unwrap(), serving_network())
        .with_offline_store(OfflineStore::open_in_memory().unwrap());

    let err = agent.on_sync(SYNC_TAG).await.unwrap_err();

    assert!(matches!(err, Error::Config(ref m) if m.contains("stale_claim_secs")));
}

#[tokio::test]
async fn unknown_sync_tag_is_ignored() {
    let mut agent = activated(1, serving_network())
        .await
        .with_offline_store(OfflineStore::open_in_memory().unwrap());
    let report = agent.on_sync("sync-something-else").await.unwrap();
    assert_eq!(report, ReplayReport::default());
}

#[tokio::test]
async fn ping_and_shutdown() {
    let mut agent = activated(1, serving_network()).await;
    assert_eq!(agent.handle_request(AgentRequest::Ping).await, AgentResponse::Pong);
    assert_eq!(
        agent.handle_request(AgentRequest::Shutdown).await,
        AgentResponse::ShuttingDown
    );
}
