//! Caller-owned, time-keyed cache of successful probe results

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use super::types::{NodeEndpoint, ProbeResult};
use super::NodeProbe;

#[derive(Debug, Clone)]
struct CachedProbe {
    result: ProbeResult,
    fetched_at: Instant,
}

/// Reuses a node's last successful probe for a caller-chosen window
///
/// Failed probes are never cached, so a node that errored is probed again
/// on the next request.
#[derive(Default)]
pub struct ProbeCache {
    entries: RwLock<HashMap<NodeEndpoint, CachedProbe>>,
}

impl ProbeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached result younger than `ttl`, if any
    pub async fn get_fresh(&self, endpoint: &NodeEndpoint, ttl: Duration) -> Option<ProbeResult> {
        let entries = self.entries.read().await;
        entries
            .get(endpoint)
            .filter(|cached| cached.fetched_at.elapsed() < ttl)
            .map(|cached| cached.result.clone())
    }

    pub async fn insert(&self, endpoint: &NodeEndpoint, result: ProbeResult) {
        let mut entries = self.entries.write().await;
        entries.insert(
            endpoint.clone(),
            CachedProbe {
                result,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Return a fresh cached result or probe the node
    ///
    /// A zero `ttl` disables caching for the call.
    pub async fn get_or_probe(
        &self,
        probe: &NodeProbe,
        endpoint: &NodeEndpoint,
        ttl: Duration,
    ) -> ProbeResult {
        if ttl.is_zero() {
            return probe.probe(endpoint).await;
        }

        if let Some(cached) = self.get_fresh(endpoint, ttl).await {
            debug!("Using cached probe of {}", endpoint.host);
            return cached;
        }

        let result = probe.probe(endpoint).await;
        if result.is_ok() {
            self.insert(endpoint, result.clone()).await;
        }
        result
    }

    /// Drop entries older than `max_age`, returning how many were removed
    pub async fn evict_older_than(&self, max_age: Duration) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, cached| cached.fetched_at.elapsed() < max_age);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
