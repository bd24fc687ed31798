// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Route table mapping intercepted GET requests to a caching strategy.
//!
//! The table is built once at install time from the deployed
//! [`Generation`]. Cache names carry the generation number, so activating a
//! new generation can discard every name that is not in its allow-list.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::network::Request;

/// How a matched request is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Serve from cache; on miss fetch and populate.
    CacheFirst,
    /// Fetch; cache 200 responses; fall back to cache on failure.
    NetworkFirst,
    /// Serve from cache and refresh it from the network in the same call.
    StaleWhileRevalidate,
    /// Always fetch; never cache.
    NetworkOnly,
    /// Serve from cache only.
    CacheOnly,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache_first",
            Strategy::NetworkFirst => "network_first",
            Strategy::StaleWhileRevalidate => "stale_while_revalidate",
            Strategy::NetworkOnly => "network_only",
            Strategy::CacheOnly => "cache_only",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which of the generation's two caches a route writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheClass {
    Static,
    Dynamic,
}

/// A deployed cache generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
    pub version: u32,
}

impl Generation {
    pub fn new(version: u32) -> Self {
        Generation { version }
    }

    pub fn static_cache(&self) -> String {
        format!("static-v{}", self.version)
    }

    pub fn dynamic_cache(&self) -> String {
        format!("dynamic-v{}", self.version)
    }

    pub fn cache_name(&self, class: CacheClass) -> String {
        match class {
            CacheClass::Static => self.static_cache(),
            CacheClass::Dynamic => self.dynamic_cache(),
        }
    }

    /// Cache names that survive activation of this generation.
    pub fn allow_list(&self) -> Vec<String> {
        vec![self.static_cache(), self.dynamic_cache()]
    }

    pub fn allows(&self, cache_name: &str) -> bool {
        cache_name == self.static_cache() || cache_name == self.dynamic_cache()
    }
}

/// One entry of the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub prefix: String,
    /// Match the whole path rather than a prefix.
    #[serde(default)]
    pub exact: bool,
    pub strategy: Strategy,
    pub cache: CacheClass,
}

impl Route {
    pub fn prefix(prefix: &str, strategy: Strategy, cache: CacheClass) -> Self {
        Route {
            prefix: prefix.to_string(),
            exact: false,
            strategy,
            cache,
        }
    }

    pub fn exact(path: &str, strategy: Strategy, cache: CacheClass) -> Self {
        Route {
            prefix: path.to_string(),
            exact: true,
            strategy,
            cache,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.exact {
            path == self.prefix
        } else {
            path.starts_with(&self.prefix)
        }
    }
}

/// The resolved caching decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub cache_name: String,
    pub strategy: Strategy,
    pub matched_route_prefix: String,
}

/// Static asset prefixes served cache-first.
pub const STATIC_PREFIXES: &[&str] = &["/static/", "/assets/", "/icons/"];

/// Static asset paths matched exactly.
pub const STATIC_PATHS: &[&str] = &["/manifest.json", "/favicon.ico", "/"];

/// Read APIs served network-first with a cached fallback.
pub const READ_API_PREFIXES: &[&str] = &[
    "/api/users/profile",
    "/api/posts/feed",
    "/api/notifications",
];

/// Ordered route table; the first matching route wins.
#[derive(Debug, Clone)]
pub struct RouteTable {
    generation: Generation,
    routes: Vec<Route>,
}

impl RouteTable {
    /// The default table for a generation.
    pub fn new(generation: Generation) -> Self {
        let mut routes = Vec::new();
        for prefix in STATIC_PREFIXES {
            routes.push(Route::prefix(prefix, Strategy::CacheFirst, CacheClass::Static));
        }
        for path in STATIC_PATHS {
            routes.push(Route::exact(path, Strategy::CacheFirst, CacheClass::Static));
        }
        for prefix in READ_API_PREFIXES {
            routes.push(Route::prefix(
                prefix,
                Strategy::NetworkFirst,
                CacheClass::Dynamic,
            ));
        }
        routes.push(Route::prefix(
            "/api/",
            Strategy::NetworkOnly,
            CacheClass::Dynamic,
        ));
        RouteTable { generation, routes }
    }

    /// Add routes ahead of the defaults.
    pub fn with_routes(mut self, extra: impl IntoIterator<Item = Route>) -> Self {
        let mut routes: Vec<Route> = extra.into_iter().collect();
        routes.append(&mut self.routes);
        self.routes = routes;
        self
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Resolve a GET request.
    ///
    /// Navigations are always network-first into the dynamic cache.
    /// Unmatched requests are network-first as well.
    pub fn resolve(&self, request: &Request) -> CacheEntry {
        let path = request.route_path();

        if request.is_navigation() {
            return CacheEntry {
                cache_name: self.generation.dynamic_cache(),
                strategy: Strategy::NetworkFirst,
                matched_route_prefix: path.to_string(),
            };
        }

        match self.routes.iter().find(|route| route.matches(path)) {
            Some(route) => CacheEntry {
                cache_name: self.generation.cache_name(route.cache),
                strategy: route.strategy,
                matched_route_prefix: route.prefix.clone(),
            },
            None => CacheEntry {
                cache_name: self.generation.dynamic_cache(),
                strategy: Strategy::NetworkFirst,
                matched_route_prefix: String::new(),
            },
        }
    }
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
