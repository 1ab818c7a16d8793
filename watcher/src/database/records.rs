//! Watch record entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::ports;
use crate::health::{HealthAssessment, HealthVerdict};
use crate::probe::NodeEndpoint;

/// Identity of a watch: one subscriber watching one host
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchKey {
    pub subscriber_id: i64,
    pub host: String,
}

impl fmt::Display for WatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.subscriber_id, self.host)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchRecord {
    pub subscriber_id: i64,
    pub host: String,
    pub api_port: u16,
    pub metrics_port: Option<u16>,
    pub seed_port: Option<u16>,
    pub verdict: HealthVerdict,
    /// Last time the verdict or the error list changed
    pub modified: DateTime<Utc>,
    /// Last persisted evaluation
    pub checked: DateTime<Utc>,
    pub errors: Vec<String>,
    pub alarm_sent: DateTime<Utc>,
}

impl WatchRecord {
    /// Fresh record on the default ports, unknown and immediately stale
    pub fn new(subscriber_id: i64, host: impl Into<String>) -> Self {
        Self {
            subscriber_id,
            host: host.into(),
            api_port: ports::API,
            metrics_port: Some(ports::METRICS),
            seed_port: Some(ports::SEED),
            verdict: HealthVerdict::Unknown,
            modified: DateTime::<Utc>::UNIX_EPOCH,
            checked: DateTime::<Utc>::UNIX_EPOCH,
            errors: Vec::new(),
            alarm_sent: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn with_ports(mut self, api: u16, metrics: Option<u16>, seed: Option<u16>) -> Self {
        self.api_port = api;
        self.metrics_port = metrics;
        self.seed_port = seed;
        self
    }

    pub fn key(&self) -> WatchKey {
        WatchKey {
            subscriber_id: self.subscriber_id,
            host: self.host.clone(),
        }
    }

    /// Watched nodes are always probed over plain HTTP
    pub fn endpoint(&self) -> NodeEndpoint {
        let mut endpoint = NodeEndpoint::new(self.host.clone());
        endpoint.api_port = self.api_port;
        endpoint.metrics_port = self.metrics_port;
        endpoint.seed_port = self.seed_port;
        endpoint
    }

    /// Unhealthy and changed since the last alert
    pub fn is_alarming(&self) -> bool {
        self.verdict == HealthVerdict::Unhealthy && self.alarm_sent < self.modified
    }

    /// Apply a fresh assessment taken at `now`, returning whether it changed
    /// the status
    ///
    /// `checked` always moves to `now`; `modified` only on change.
    pub fn apply_assessment(&mut self, assessment: &HealthAssessment, now: DateTime<Utc>) -> bool {
        let verdict = assessment.verdict();
        let changed = self.verdict == HealthVerdict::Unknown
            || self.verdict != verdict
            || self.errors != assessment.errors;

        if changed {
            self.verdict = verdict;
            self.errors = assessment.errors.clone();
            self.modified = now;
        }
        self.checked = now;
        changed
    }
}

impl fmt::Display for WatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verdict {
            HealthVerdict::Unknown => write!(f, "❓ {} - Unknown status", self.host),
            HealthVerdict::Healthy => write!(f, "✅ {} - OK", self.host),
            HealthVerdict::Unhealthy => {
                let lines: Vec<String> = self
                    .errors
                    .iter()
                    .map(|error| format!("❗{} - {}", self.host, error))
                    .collect();
                write!(f, "{}", lines.join("\n"))
            }
        }
    }
}
