pub mod manager;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::defaults;
use crate::errors::ConfigError;
use crate::probe::{NodeEndpoint, Protocol};

pub use manager::ConfigManager;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Alerts are only logged when unset
    pub notification_webhook_url: Option<String>,
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_max_watches_per_subscriber")]
    pub max_watches_per_subscriber: usize,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_seconds: u64,
    #[serde(default = "default_max_check_age")]
    pub max_check_age_seconds: u64,
    #[serde(default = "default_alert_interval")]
    pub alert_interval_seconds: u64,
    #[serde(default = "default_port_timeout")]
    pub port_timeout_seconds: u64,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
    #[serde(default = "default_out_of_sync_threshold")]
    pub out_of_sync_threshold: u64,
    #[serde(default = "default_probe_cache")]
    pub probe_cache_seconds: u64,
    #[serde(default = "default_reference_refresh")]
    pub reference_refresh_seconds: u64,
    #[serde(default)]
    pub reference: ReferenceNodeConfig,
}

/// Trusted node every watched node is compared against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceNodeConfig {
    pub host: String,
    #[serde(default = "default_reference_protocol")]
    pub protocol: Protocol,
    #[serde(default = "default_reference_api_port")]
    pub api_port: u16,
    pub metrics_port: Option<u16>,
    pub seed_port: Option<u16>,
}

impl Default for ReferenceNodeConfig {
    fn default() -> Self {
        Self {
            host: defaults::REFERENCE_HOST.to_string(),
            protocol: default_reference_protocol(),
            api_port: defaults::REFERENCE_API_PORT,
            metrics_port: None,
            seed_port: None,
        }
    }
}

impl ReferenceNodeConfig {
    pub fn endpoint(&self) -> NodeEndpoint {
        NodeEndpoint {
            host: self.host.clone(),
            protocol: self.protocol,
            api_port: self.api_port,
            metrics_port: self.metrics_port,
            seed_port: self.seed_port,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            notification_webhook_url: None,
            worker_threads: default_worker_threads(),
            queue_capacity: default_queue_capacity(),
            max_watches_per_subscriber: default_max_watches_per_subscriber(),
            tick_interval_seconds: default_tick_interval(),
            max_check_age_seconds: default_max_check_age(),
            alert_interval_seconds: default_alert_interval(),
            port_timeout_seconds: default_port_timeout(),
            http_timeout_seconds: default_http_timeout(),
            out_of_sync_threshold: default_out_of_sync_threshold(),
            probe_cache_seconds: default_probe_cache(),
            reference_refresh_seconds: default_reference_refresh(),
            reference: ReferenceNodeConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == 0 {
            return Err(invalid("worker_threads", "must be at least 1"));
        }
        if self.worker_threads > defaults::MAX_WORKER_THREADS {
            return Err(ConfigError::InvalidValue {
                field: "worker_threads".to_string(),
                reason: format!("must be at most {}", defaults::MAX_WORKER_THREADS),
            });
        }
        if self.queue_capacity > defaults::MAX_QUEUE_CAPACITY {
            return Err(ConfigError::InvalidValue {
                field: "queue_capacity".to_string(),
                reason: format!("must be at most {}", defaults::MAX_QUEUE_CAPACITY),
            });
        }
        if self.tick_interval_seconds == 0 {
            return Err(invalid("tick_interval_seconds", "must be greater than 0"));
        }
        if self.alert_interval_seconds == 0 {
            return Err(invalid("alert_interval_seconds", "must be greater than 0"));
        }
        if self.port_timeout_seconds == 0 || self.http_timeout_seconds == 0 {
            return Err(invalid("timeouts", "must be greater than 0"));
        }
        if self.reference.host.trim().is_empty() {
            return Err(invalid("reference.host", "must not be empty"));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_seconds)
    }

    pub fn max_check_age(&self) -> Duration {
        Duration::from_secs(self.max_check_age_seconds)
    }

    pub fn alert_interval(&self) -> Duration {
        Duration::from_secs(self.alert_interval_seconds)
    }

    pub fn port_timeout(&self) -> Duration {
        Duration::from_secs(self.port_timeout_seconds)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    pub fn probe_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.probe_cache_seconds)
    }

    pub fn reference_refresh(&self) -> Duration {
        Duration::from_secs(self.reference_refresh_seconds)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn default_host() -> String {
    defaults::HOST.to_string()
}

fn default_port() -> u16 {
    defaults::PORT
}

fn default_database_path() -> String {
    defaults::DATABASE_PATH.to_string()
}

fn default_worker_threads() -> usize {
    defaults::WORKER_THREADS
}

fn default_queue_capacity() -> usize {
    defaults::QUEUE_CAPACITY
}

fn default_max_watches_per_subscriber() -> usize {
    defaults::MAX_WATCHES_PER_SUBSCRIBER
}

fn default_tick_interval() -> u64 {
    defaults::TICK_INTERVAL_SECONDS
}

fn default_max_check_age() -> u64 {
    defaults::MAX_CHECK_AGE_SECONDS
}

fn default_alert_interval() -> u64 {
    defaults::ALERT_INTERVAL_SECONDS
}

fn default_port_timeout() -> u64 {
    defaults::PORT_TIMEOUT_SECONDS
}

fn default_http_timeout() -> u64 {
    defaults::HTTP_TIMEOUT_SECONDS
}

fn default_out_of_sync_threshold() -> u64 {
    defaults::OUT_OF_SYNC_THRESHOLD
}

fn default_probe_cache() -> u64 {
    defaults::PROBE_CACHE_SECONDS
}

fn default_reference_refresh() -> u64 {
    defaults::REFERENCE_REFRESH_SECONDS
}

fn default_reference_api_port() -> u16 {
    defaults::REFERENCE_API_PORT
}

fn default_reference_protocol() -> Protocol {
    match defaults::REFERENCE_PROTOCOL {
        "http" => Protocol::Http,
        _ => Protocol::Https,
    }
}
