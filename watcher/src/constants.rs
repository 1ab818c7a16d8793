//! Central repository for timeouts, intervals, limits and default values
//!
//! Constants are grouped by the component that consumes them so the
//! defaults used by `config` and the fixed values used by the probe and
//! the evaluator live in one place.

/// Node probe constants
pub mod probe {
    /// Metric family carrying the state sync versions
    pub const SYNC_METRIC_FAMILY: &str = "aptos_state_sync_version";

    /// Label distinguishing samples inside the sync family
    pub const SYNC_TYPE_LABEL: &str = "type";

    pub const SYNCED_SAMPLE: &str = "synced";

    pub const EXECUTED_SAMPLE: &str = "executed_transactions";

    /// Path of the metrics endpoint on the metrics port
    pub const METRICS_PATH: &str = "/metrics";
}

/// Default node ports used when a subscriber does not provide them
pub mod ports {
    pub const API: u16 = 8080;
    pub const METRICS: u16 = 9101;
    pub const SEED: u16 = 6180;
}

/// Error codes produced by the health evaluator
///
/// These strings are persisted and shown to subscribers verbatim, so they
/// must stay stable.
pub mod health_errors {
    pub const SEED_PORT_CLOSED: &str = "Seed port is closed";
    pub const METRICS_PORT_CLOSED: &str = "Metrics port is closed";
    pub const NOT_SYNCED: &str = "Not synced";
    pub const API_PORT_CLOSED: &str = "API port is closed";
    pub const OUT_OF_DATE: &str = "Node is out of date. Update it";
}

/// Alert dispatcher constants
pub mod alerts {
    /// Header line of every aggregated alert message
    pub const MESSAGE_HEADER: &str = "❗Node alert❗";

    /// Webhook request timeout
    pub const WEBHOOK_TIMEOUT_SECONDS: u64 = 10;

    /// Delay before the first dispatcher run after startup
    pub const FIRST_RUN_DELAY_SECONDS: u64 = 10;
}

/// Default configuration values
pub mod defaults {
    pub const HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 8095;
    pub const DATABASE_PATH: &str = "data/watches.db";

    /// Number of concurrent evaluation workers
    pub const WORKER_THREADS: usize = 10;

    /// Pending evaluations admitted beyond the running ones
    pub const QUEUE_CAPACITY: usize = 1000;

    /// Upper bounds keeping the worker pool semaphores within their limits
    pub const MAX_WORKER_THREADS: usize = 4096;
    pub const MAX_QUEUE_CAPACITY: usize = 1_000_000;

    /// Per-subscriber watch cap, 0 disables the cap
    pub const MAX_WATCHES_PER_SUBSCRIBER: usize = 1;

    pub const TICK_INTERVAL_SECONDS: u64 = 10;
    pub const MAX_CHECK_AGE_SECONDS: u64 = 300;
    pub const ALERT_INTERVAL_SECONDS: u64 = 600;

    pub const PORT_TIMEOUT_SECONDS: u64 = 5;
    pub const HTTP_TIMEOUT_SECONDS: u64 = 5;

    /// Maximum |synced - executed| version gap still considered in sync
    pub const OUT_OF_SYNC_THRESHOLD: u64 = 10;

    /// Reuse window for target probe results
    pub const PROBE_CACHE_SECONDS: u64 = 60;

    /// Reuse window for reference node probe results
    pub const REFERENCE_REFRESH_SECONDS: u64 = 3600;

    pub const REFERENCE_HOST: &str = "fullnode.devnet.aptoslabs.com";
    pub const REFERENCE_PROTOCOL: &str = "https";
    pub const REFERENCE_API_PORT: u16 = 443;
}
