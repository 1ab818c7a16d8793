//! Custom error types for the node watcher
//!
//! Provides structured error handling with context for the failure
//! scenarios the watcher distinguishes: probe failures (transient, kept on
//! the probe result), store failures (including the subscriber quota), an
//! unavailable reference node, and configuration problems, which surface at
//! startup through `anyhow`.

use std::fmt;

/// Main error type for the node watcher
#[derive(Debug)]
pub enum WatcherError {
    /// Node probe errors
    Probe(ProbeError),

    /// Watch store errors
    Store(StoreError),

    /// The reference node could not be probed, so nothing can be compared
    ReferenceUnavailable { reason: String },

    /// Other errors with context
    Other(String),
}

/// Configuration error variants
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to load configuration file
    LoadFailed { path: String, reason: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },

    /// Configuration parsing error
    ParseError { reason: String },
}

/// Node probe error variants
///
/// Probe errors never escape the probe: they are stored on the
/// `ProbeResult` and inspected by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeError {
    /// Request did not complete within its deadline
    Timeout { url: String },

    /// Request could not be sent or the body could not be read
    Request { url: String, reason: String },

    /// Node answered with a non-success status code
    HttpStatus { url: String, status: u16 },

    /// Body could not be parsed
    InvalidResponse { url: String, reason: String },

    /// Sync metric family present but a required sample is missing
    MissingSyncSamples { host: String, missing: String },
}

/// Watch store error variants
#[derive(Debug)]
pub enum StoreError {
    /// Subscriber already watches the maximum number of hosts
    QuotaExceeded { subscriber_id: i64, limit: usize },

    /// Query execution failed
    Query { reason: String },

    /// Data serialization/deserialization error
    Serialization { reason: String },
}

impl fmt::Display for WatcherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatcherError::Probe(e) => write!(f, "Probe error: {}", e),
            WatcherError::Store(e) => write!(f, "Store error: {}", e),
            WatcherError::ReferenceUnavailable { reason } => {
                write!(f, "Reference node unavailable: {}", reason)
            }
            WatcherError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::ParseError { reason } => {
                write!(f, "Failed to parse config: {}", reason)
            }
        }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Timeout { url } => write!(f, "Request to {} timed out", url),
            ProbeError::Request { url, reason } => {
                write!(f, "Request to {} failed: {}", url, reason)
            }
            ProbeError::HttpStatus { url, status } => {
                write!(f, "{} returned HTTP {}", url, status)
            }
            ProbeError::InvalidResponse { url, reason } => {
                write!(f, "Invalid response from {}: {}", url, reason)
            }
            ProbeError::MissingSyncSamples { host, missing } => {
                write!(f, "Sync metrics of {} lack the '{}' sample", host, missing)
            }
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::QuotaExceeded {
                subscriber_id,
                limit,
            } => {
                write!(
                    f,
                    "Subscriber {} already watches the maximum of {} nodes",
                    subscriber_id, limit
                )
            }
            StoreError::Query { reason } => write!(f, "Query failed: {}", reason),
            StoreError::Serialization { reason } => {
                write!(f, "Serialization error: {}", reason)
            }
        }
    }
}

impl std::error::Error for WatcherError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for ProbeError {}
impl std::error::Error for StoreError {}

impl From<anyhow::Error> for WatcherError {
    fn from(err: anyhow::Error) -> Self {
        WatcherError::Other(err.to_string())
    }
}

impl From<ProbeError> for WatcherError {
    fn from(err: ProbeError) -> Self {
        WatcherError::Probe(err)
    }
}

impl From<StoreError> for WatcherError {
    fn from(err: StoreError) -> Self {
        WatcherError::Store(err)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Query {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization {
            reason: err.to_string(),
        }
    }
}
