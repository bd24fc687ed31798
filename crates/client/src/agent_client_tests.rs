// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tether_ipc::AgentState;
use tokio::net::UnixListener;

/// Serve one canned response per connection, recording each request.
fn serve(dir: &TempDir, response: AgentResponse) -> Arc<Mutex<Vec<AgentRequest>>> {
    let listener = UnixListener::bind(dir.path().join(SOCKET_NAME)).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let request: AgentRequest = framing::read_message(&mut stream).await.unwrap();
            recorded.lock().unwrap().push(request);
            framing::write_message(&mut stream, &response)
                .await
                .unwrap();
        }
    });
    seen
}

#[tokio::test]
async fn missing_socket_reports_agent_unavailable() {
    let dir = TempDir::new().unwrap();
    let client = AgentClient::in_state_dir(dir.path());

    let err = client.ping().await.unwrap_err();

    assert!(matches!(err, Error::AgentUnavailable(ref path) if path.ends_with(SOCKET_NAME)));
}

#[tokio::test]
async fn status_round_trip() {
    let dir = TempDir::new().unwrap();
    let status = AgentStatus {
        version: 2,
        state: AgentState::Activated,
        caches: vec!["static-v1".to_string(), "static-v2".to_string()],
        allow_list: vec!["static-v2".to_string(), "dynamic-v2".to_string()],
        uptime_secs: 12,
    };
    let seen = serve(&dir, AgentResponse::Status(status.clone()));
    let client = AgentClient::in_state_dir(dir.path());

    assert_eq!(client.status().await.unwrap(), status);
    assert_eq!(*seen.lock().unwrap(), vec![AgentRequest::Status]);
}

#[tokio::test]
async fn error_response_becomes_agent_error() {
    let dir = TempDir::new().unwrap();
    serve(
        &dir,
        AgentResponse::Error {
            message: "not active".to_string(),
        },
    );
    let mut client = AgentClient::in_state_dir(dir.path());

    let err = client
        .request(AgentRequest::CacheUrls { urls: vec![] })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Agent(ref m) if m == "not active"));
}

#[tokio::test]
async fn unexpected_variant_is_reported() {
    let dir = TempDir::new().unwrap();
    serve(&dir, AgentResponse::Ok);
    let client = AgentClient::in_state_dir(dir.path());

    let err = client.ping().await.unwrap_err();

    assert!(err.to_string().contains("unexpected response"));
}
