// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::test_helpers::HttpStub;
use serde_json::json;
use yare::parameterized;

#[parameterized(
    trailing_slash = { "http://localhost:3000/", "/api/posts" },
    bare = { "http://localhost:3000", "api/posts" },
    both = { "http://localhost:3000/", "api/posts" },
)]
fn url_for_joins_with_one_slash(base: &str, path: &str) {
    assert_eq!(
        ApiClient::new(base).url_for(path),
        "http://localhost:3000/api/posts"
    );
}

#[tokio::test]
async fn submit_posts_to_kind_endpoint_with_bearer() {
    let server = HttpStub::start(201).await;
    let api = ApiClient::new(&server.base_url).with_token(Some("tok".to_string()));

    api.submit(ActionKind::Message, &json!({"recipientId": "u2", "content": "hi"}))
        .await
        .unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/api/messages");
    assert_eq!(requests[0].header("authorization"), Some("Bearer tok"));
    assert_eq!(requests[0].json()["content"], "hi");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = HttpStub::start(500).await;
    let api = ApiClient::new(&server.base_url);

    let err = api
        .submit(ActionKind::Post, &json!({"text": "x"}))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn drafts_are_never_submitted() {
    let server = HttpStub::start(201).await;
    let api = ApiClient::new(&server.base_url);

    let err = api
        .submit(ActionKind::Draft, &json!({"text": "x"}))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::LocalOnly(ActionKind::Draft)));
    assert!(server.requests().is_empty());
}
