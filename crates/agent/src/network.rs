// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network abstraction for the agent's fetch capability.
//!
//! Provides a trait-based network layer that enables:
//! - Real HTTP requests through reqwest for production
//! - Scripted mock networks for unit testing

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Error type for network operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// The request never produced a response.
    #[error("network unreachable: {0}")]
    Unreachable(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// HTTP method of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request as seen by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Path plus query, e.g. `/api/posts/feed?page=2`.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Request {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Request::new(Method::Get, path)
    }

    /// A top-level document navigation.
    pub fn navigate(path: impl Into<String>) -> Self {
        Request::get(path).with_header("accept", "text/html")
    }

    /// A request carrying a JSON body.
    pub fn json(
        method: Method,
        path: impl Into<String>,
        body: &serde_json::Value,
    ) -> Result<Self, NetworkError> {
        let bytes =
            serde_json::to_vec(body).map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;
        Ok(Request {
            body: Some(bytes),
            ..Request::new(method, path)
        }
        .with_header("content-type", "application/json"))
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    /// Attach `Authorization: Bearer <token>` when a token is known.
    pub fn with_bearer(self, token: Option<&str>) -> Self {
        match token {
            Some(token) => self.with_header("authorization", &format!("Bearer {}", token)),
            None => self,
        }
    }

    /// First header value with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// True for HTML document navigations.
    pub fn is_navigation(&self) -> bool {
        self.method == Method::Get
            && (self.header("sec-fetch-mode") == Some("navigate")
                || self.header("accept").is_some_and(|a| a.contains("text/html")))
    }

    /// Path without query string or fragment.
    pub fn route_path(&self) -> &str {
        self.path
            .split(['?', '#'])
            .next()
            .unwrap_or(self.path.as_str())
    }
}

/// A response as stored in and served from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Response {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Future returned by [`Network::fetch`].
pub type NetworkFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Response, NetworkError>> + Send + 'a>>;

/// The agent's own fetch capability.
pub trait Network: Send + Sync {
    /// Perform a request against the origin server.
    fn fetch<'a>(&'a self, request: &'a Request) -> NetworkFuture<'a>;
}

/// [`Network`] backed by a reqwest client rooted at the API origin.
pub struct HttpNetwork {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNetwork {
    pub fn new(base_url: &str) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;
        Ok(HttpNetwork {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }
}

impl Network for HttpNetwork {
    fn fetch<'a>(&'a self, request: &'a Request) -> NetworkFuture<'a> {
        Box::pin(async move {
            let method = match request.method {
                Method::Get => reqwest::Method::GET,
                Method::Post => reqwest::Method::POST,
                Method::Put => reqwest::Method::PUT,
                Method::Patch => reqwest::Method::PATCH,
                Method::Delete => reqwest::Method::DELETE,
            };

            let mut builder = self.client.request(method, self.url_for(&request.path));
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }

            let response = builder
                .send()
                .await
                .map_err(|e| NetworkError::Unreachable(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .bytes()
                .await
                .map_err(|e| NetworkError::Unreachable(e.to_string()))?
                .to_vec();

            Ok(Response {
                status,
                headers,
                body,
            })
        })
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;
