//! Mock Aptos node for probe and evaluation tests
//!
//! One wiremock server answers both the ledger info request on `/` and the
//! metrics request on `/metrics`, so the same port serves as API and
//! metrics port. The seed port is a plain TCP listener.

use serde_json::json;
use std::time::Duration;
use tokio::net::TcpListener;
use watcher::probe::{NodeEndpoint, Protocol};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const LOCALHOST: &str = "127.0.0.1";

pub struct MockNodeServer {
    pub server: MockServer,
}

impl MockNodeServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn port(&self) -> u16 {
        self.server.address().port()
    }

    /// Ledger info in the shape the Aptos REST API returns it
    pub async fn mock_ledger(&self, chain_id: u64) {
        self.mount_ledger(ledger_response(chain_id)).await;
    }

    /// Ledger info answered only after `delay`
    pub async fn mock_slow_ledger(&self, chain_id: u64, delay: Duration) {
        self.mount_ledger(ledger_response(chain_id).set_delay(delay))
            .await;
    }

    async fn mount_ledger(&self, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_ledger_failure(&self, status_code: u16) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(status_code))
            .mount(&self.server)
            .await;
    }

    /// State sync metrics with the given synced and executed versions
    pub async fn mock_metrics(&self, synced: u64, executed: u64) {
        let body = format!(
            "# HELP aptos_state_sync_version The versions processed by state sync\n\
             # TYPE aptos_state_sync_version gauge\n\
             aptos_state_sync_version{{type=\"applied_transaction_outputs\"}} 0\n\
             aptos_state_sync_version{{type=\"executed_transactions\"}} {}\n\
             aptos_state_sync_version{{type=\"synced\"}} {}\n\
             # HELP aptos_connections Number of current connections\n\
             # TYPE aptos_connections gauge\n\
             aptos_connections{{direction=\"inbound\",network_id=\"Public\"}} 3\n",
            executed, synced
        );
        self.mock_metrics_body(&body).await;
    }

    pub async fn mock_metrics_body(&self, body: &str) {
        Mock::given(method("GET"))
            .and(path("/metrics"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
            .mount(&self.server)
            .await;
    }

    /// Endpoint using this server for API and metrics and `seed_port` for seeds
    pub fn endpoint(&self, seed_port: Option<u16>) -> NodeEndpoint {
        NodeEndpoint {
            host: LOCALHOST.to_string(),
            protocol: Protocol::Http,
            api_port: self.port(),
            metrics_port: Some(self.port()),
            seed_port,
        }
    }

    /// Endpoint suitable as reference node: API only
    pub fn reference_endpoint(&self) -> NodeEndpoint {
        NodeEndpoint {
            host: LOCALHOST.to_string(),
            protocol: Protocol::Http,
            api_port: self.port(),
            metrics_port: None,
            seed_port: None,
        }
    }
}

fn ledger_response(chain_id: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "chain_id": chain_id,
        "epoch": "42",
        "ledger_version": "1234567",
        "oldest_ledger_version": "0",
        "ledger_timestamp": "1665000000000000",
        "node_role": "full_node",
        "oldest_block_height": "0",
        "block_height": "500000"
    }))
}

/// Listening TCP socket standing in for a node's seed port
pub struct SeedListener {
    _listener: TcpListener,
    pub port: u16,
}

impl SeedListener {
    pub async fn start() -> Self {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        Self {
            _listener: listener,
            port,
        }
    }
}

/// A port nothing listens on
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    listener.local_addr().unwrap().port()
}
