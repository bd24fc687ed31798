// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Caching strategies applied to intercepted GET requests.

use crate::error::{Error, Result};
use crate::network::{Network, Request, Response};
use crate::offline::offline_response;
use crate::routes::{CacheEntry, Strategy};
use crate::storage::AgentStore;

/// Answer `request` according to `entry`.
pub async fn respond<N>(
    storage: &mut AgentStore,
    network: &N,
    entry: &CacheEntry,
    request: &Request,
) -> Result<Response>
where
    N: Network + ?Sized,
{
    tracing::trace!(
        path = %request.path,
        strategy = %entry.strategy,
        cache = %entry.cache_name,
        "resolving request"
    );
    match entry.strategy {
        Strategy::CacheFirst => cache_first(storage, network, entry, request).await,
        Strategy::NetworkFirst => network_first(storage, network, entry, request).await,
        Strategy::StaleWhileRevalidate => {
            stale_while_revalidate(storage, network, entry, request).await
        }
        Strategy::NetworkOnly => Ok(network.fetch(request).await?),
        Strategy::CacheOnly => storage
            .lookup(&entry.cache_name, &request.path)?
            .ok_or_else(|| Error::NotCached(request.path.clone())),
    }
}

/// Network-first for a navigation, falling back to the cached root document
/// and then the built-in offline document.
pub async fn navigate<N>(
    storage: &mut AgentStore,
    network: &N,
    entry: &CacheEntry,
    request: &Request,
) -> Result<Response>
where
    N: Network + ?Sized,
{
    match network_first(storage, network, entry, request).await {
        Ok(response) => Ok(response),
        Err(Error::Network(e)) => {
            tracing::debug!(path = %request.path, error = %e, "navigation offline");
            match storage.lookup_any("/")? {
                Some(root) => Ok(root),
                None => Ok(offline_response()),
            }
        }
        Err(e) => Err(e),
    }
}

async fn cache_first<N>(
    storage: &mut AgentStore,
    network: &N,
    entry: &CacheEntry,
    request: &Request,
) -> Result<Response>
where
    N: Network + ?Sized,
{
    if let Some(cached) = storage.lookup(&entry.cache_name, &request.path)? {
        return Ok(cached);
    }
    let response = network.fetch(request).await?;
    if response.is_success() {
        storage.put(&entry.cache_name, &request.path, &response)?;
    }
    Ok(response)
}

async fn network_first<N>(
    storage: &mut AgentStore,
    network: &N,
    entry: &CacheEntry,
    request: &Request,
) -> Result<Response>
where
    N: Network + ?Sized,
{
    match network.fetch(request).await {
        Ok(response) => {
            // Only complete 200 responses are worth replaying offline
            if response.status == 200 {
                storage.put(&entry.cache_name, &request.path, &response)?;
            }
            Ok(response)
        }
        Err(e) => match storage.lookup(&entry.cache_name, &request.path)? {
            Some(cached) => {
                tracing::debug!(path = %request.path, "serving cached response while offline");
                Ok(cached)
            }
            None => Err(e.into()),
        },
    }
}

async fn stale_while_revalidate<N>(
    storage: &mut AgentStore,
    network: &N,
    entry: &CacheEntry,
    request: &Request,
) -> Result<Response>
where
    N: Network + ?Sized,
{
    let cached = storage.lookup(&entry.cache_name, &request.path)?;
    match network.fetch(request).await {
        Ok(fresh) => {
            if fresh.status == 200 {
                storage.put(&entry.cache_name, &request.path, &fresh)?;
            }
            Ok(cached.unwrap_or(fresh))
        }
        Err(e) => cached.ok_or_else(|| e.into()),
    }
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
