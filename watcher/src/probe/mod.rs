//! Node probing
//!
//! Reachability tests on the API, metrics and seed ports plus the two HTTP
//! fetches (ledger info and sync metrics) that feed the health evaluator.

mod cache;
pub mod ledger;
pub mod metrics;
pub mod ports;
pub mod types;

pub use cache::ProbeCache;
pub use types::{LedgerInfo, NodeEndpoint, ProbeResult, Protocol, SyncStatus};

use anyhow::{anyhow, Result};
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::errors::ProbeError;

/// Probes nodes; holds no per-node state
#[derive(Clone)]
pub struct NodeProbe {
    client: HttpClient,
    port_timeout: Duration,
    http_timeout: Duration,
    out_of_sync_threshold: u64,
}

impl NodeProbe {
    pub fn new(
        port_timeout: Duration,
        http_timeout: Duration,
        out_of_sync_threshold: u64,
    ) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(http_timeout)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            port_timeout,
            http_timeout,
            out_of_sync_threshold,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.port_timeout(),
            config.http_timeout(),
            config.out_of_sync_threshold,
        )
    }

    /// Probe a node; failures are recorded on the result, never returned
    #[instrument(skip(self), fields(host = %endpoint.host))]
    pub async fn probe(&self, endpoint: &NodeEndpoint) -> ProbeResult {
        let mut result = ProbeResult::new(endpoint.host.clone());

        let (api_open, metrics_open, seed_open) = tokio::join!(
            ports::is_port_open(&endpoint.host, Some(endpoint.api_port), self.port_timeout),
            ports::is_port_open(&endpoint.host, endpoint.metrics_port, self.port_timeout),
            ports::is_port_open(&endpoint.host, endpoint.seed_port, self.port_timeout),
        );
        result.api_port_open = api_open;
        result.metrics_port_open = metrics_open;
        result.seed_port_open = seed_open;

        if let Err(e) = self.fetch_details(endpoint, &mut result).await {
            warn!("Probe of {} failed: {}", endpoint.host, e);
            result.error = Some(e);
        }

        debug!(
            "Probed {}: api={} metrics={} seed={} sync={:?}",
            endpoint.host, result.api_port_open, result.metrics_port_open, result.seed_port_open, result.sync
        );
        result
    }

    async fn fetch_details(
        &self,
        endpoint: &NodeEndpoint,
        result: &mut ProbeResult,
    ) -> Result<(), ProbeError> {
        if result.api_port_open {
            let info =
                ledger::fetch_ledger_info(&self.client, &endpoint.api_url(), self.http_timeout)
                    .await?;
            result.ledger = Some(info);
        }

        if let Some(url) = endpoint.metrics_url() {
            if result.metrics_port_open {
                result.sync = metrics::fetch_sync_status(
                    &self.client,
                    &endpoint.host,
                    &url,
                    self.http_timeout,
                    self.out_of_sync_threshold,
                )
                .await?;
            }
        }

        Ok(())
    }
}
