//! Probe input and output types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::constants::{ports, probe};
use crate::errors::ProbeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and how to reach a node
///
/// `None` for the metrics or seed port means the port is not monitored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeEndpoint {
    pub host: String,
    pub protocol: Protocol,
    pub api_port: u16,
    pub metrics_port: Option<u16>,
    pub seed_port: Option<u16>,
}

impl NodeEndpoint {
    /// Endpoint with the default Aptos full-node ports over plain HTTP
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            protocol: Protocol::Http,
            api_port: ports::API,
            metrics_port: Some(ports::METRICS),
            seed_port: Some(ports::SEED),
        }
    }

    pub fn api_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.api_port)
    }

    pub fn metrics_url(&self) -> Option<String> {
        self.metrics_port.map(|port| {
            format!(
                "{}://{}:{}{}",
                self.protocol,
                self.host,
                port,
                probe::METRICS_PATH
            )
        })
    }
}

/// Synchronization state derived from the state sync metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncStatus {
    Synced,
    Lagging,
    /// Metrics not monitored, unreachable, or the sync family is absent
    Unknown,
}

/// Subset of the node's ledger information endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerInfo {
    #[serde(deserialize_with = "u64_from_number_or_string")]
    pub chain_id: u64,
    #[serde(deserialize_with = "u64_from_number_or_string")]
    pub epoch: u64,
    #[serde(deserialize_with = "u64_from_number_or_string")]
    pub ledger_version: u64,
    #[serde(deserialize_with = "u64_from_number_or_string")]
    pub ledger_timestamp: u64,
}

/// Nodes report counters either as JSON numbers or as decimal strings
fn u64_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Outcome of one probe of one node
///
/// Port flags collected before a failure are kept, `error` records the
/// failure itself.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub host: String,
    pub api_port_open: bool,
    pub metrics_port_open: bool,
    pub seed_port_open: bool,
    pub ledger: Option<LedgerInfo>,
    pub sync: SyncStatus,
    pub error: Option<ProbeError>,
    pub probed_at: DateTime<Utc>,
}

impl ProbeResult {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_port_open: false,
            metrics_port_open: false,
            seed_port_open: false,
            ledger: None,
            sync: SyncStatus::Unknown,
            error: None,
            probed_at: Utc::now(),
        }
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.ledger.as_ref().map(|ledger| ledger.chain_id)
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
