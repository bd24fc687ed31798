// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in document served for navigations when both the network and the
//! cached root document are unavailable.

use crate::network::Response;

pub const OFFLINE_DOCUMENT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Offline</title>
<style>
body { font-family: system-ui, sans-serif; display: flex; align-items: center;
       justify-content: center; min-height: 100vh; margin: 0; text-align: center; }
button { margin-top: 1rem; padding: 0.5rem 1.5rem; }
</style>
</head>
<body>
<main>
<h1>You're offline</h1>
<p>Posts and messages you create now are saved and will be sent when you reconnect.</p>
<button onclick="location.reload()">Try again</button>
</main>
</body>
</html>
"#;

/// Header marking a response produced by the agent instead of the network.
pub const OFFLINE_HEADER: &str = "x-tether-offline";

/// The offline document as a 503 response.
pub fn offline_response() -> Response {
    Response::new(503, OFFLINE_DOCUMENT)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_header(OFFLINE_HEADER, "1")
}
