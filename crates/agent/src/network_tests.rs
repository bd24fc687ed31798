// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use yare::parameterized;

#[parameterized(
    accept_html = { Request::navigate("/feed"), true },
    fetch_mode = { Request::get("/profile/u1").with_header("Sec-Fetch-Mode", "navigate"), true },
    plain_get = { Request::get("/api/posts/feed"), false },
    post = { Request::new(Method::Post, "/").with_header("accept", "text/html"), false },
)]
fn navigation_detection(request: Request, expected: bool) {
    assert_eq!(request.is_navigation(), expected);
}

#[parameterized(
    bare = { "/api/posts/feed", "/api/posts/feed" },
    query = { "/api/posts/feed?page=2", "/api/posts/feed" },
    fragment = { "/#top", "/" },
)]
fn route_path_strips_query(path: &str, expected: &str) {
    assert_eq!(Request::get(path).route_path(), expected);
}

#[test]
fn json_request_sets_content_type_and_body() {
    let request = Request::json(Method::Post, "/api/posts", &json!({"text": "hi"}))
        .unwrap()
        .with_bearer(Some("tok"));

    assert_eq!(request.header("Content-Type"), Some("application/json"));
    assert_eq!(request.header("authorization"), Some("Bearer tok"));
    assert_eq!(request.body.as_deref(), Some(br#"{"text":"hi"}"#.as_slice()));
}

#[test]
fn bearer_is_omitted_without_token() {
    let request = Request::get("/api/notifications").with_bearer(None);
    assert!(request.header("authorization").is_none());
}

#[parameterized(
    ok = { 200, true },
    created = { 201, true },
    not_modified = { 304, false },
    server_error = { 500, false },
)]
fn response_success(status: u16, expected: bool) {
    assert_eq!(Response::new(status, "").is_success(), expected);
}

#[test]
fn http_network_joins_base_and_path() {
    let network = HttpNetwork::new("http://localhost:3000/").unwrap();
    assert_eq!(
        network.url_for("/api/posts"),
        "http://localhost:3000/api/posts"
    );
    assert_eq!(
        network.url_for("https://cdn.example/a.png"),
        "https://cdn.example/a.png"
    );
}
