//! Periodic re-checking of stale watches
//!
//! Every tick the scheduler reads the watches whose last check is older
//! than `max_check_age_seconds` and hands each one to a bounded worker
//! pool. A watch that does not fit in the pool stays stale and is picked
//! up again on the next tick.

pub mod pool;
pub mod task;

pub use pool::{Submission, WorkerPool};
pub use task::{EvaluationOutcome, WatchEvaluator};

use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::database::WatchStore;
use crate::errors::StoreError;
use crate::probe::ProbeCache;

/// Counts from one scheduler tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub due: usize,
    pub submitted: usize,
    pub already_queued: usize,
    pub rejected: usize,
}

pub struct WatchScheduler {
    store: Arc<dyn WatchStore>,
    evaluator: Arc<WatchEvaluator>,
    pool: WorkerPool,
    cache: Arc<ProbeCache>,
    tick_interval: Duration,
    max_check_age: Duration,
    /// Cache entries older than this are useless to every caller
    cache_max_age: Duration,
}

impl WatchScheduler {
    pub fn new(
        store: Arc<dyn WatchStore>,
        evaluator: Arc<WatchEvaluator>,
        pool: WorkerPool,
        cache: Arc<ProbeCache>,
        tick_interval: Duration,
        max_check_age: Duration,
        cache_max_age: Duration,
    ) -> Self {
        Self {
            store,
            evaluator,
            pool,
            cache,
            tick_interval,
            max_check_age,
            cache_max_age,
        }
    }

    pub fn from_config(
        store: Arc<dyn WatchStore>,
        evaluator: Arc<WatchEvaluator>,
        cache: Arc<ProbeCache>,
        config: &Config,
    ) -> Self {
        Self::new(
            store,
            evaluator,
            WorkerPool::new(config.worker_threads, config.queue_capacity),
            cache,
            config.tick_interval(),
            config.max_check_age(),
            config.reference_refresh().max(config.probe_cache_ttl()),
        )
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Submit every stale watch to the pool
    #[instrument(skip(self))]
    pub async fn tick(&self) -> Result<TickSummary, StoreError> {
        let evicted = self.cache.evict_older_than(self.cache_max_age).await;
        if evicted > 0 {
            debug!("Evicted {} cached probes", evicted);
        }

        let due = self.store.query_by_staleness(self.max_check_age).await?;
        let mut summary = TickSummary {
            due: due.len(),
            ..TickSummary::default()
        };

        for record in due {
            let key = record.key();
            let evaluator = self.evaluator.clone();
            let task = async move { evaluator.evaluate(record).await.map(|_| ()) };

            match self.pool.submit(key, task) {
                Submission::Accepted => summary.submitted += 1,
                Submission::AlreadyQueued => summary.already_queued += 1,
                Submission::Rejected => summary.rejected += 1,
            }
        }

        if summary.rejected > 0 {
            warn!(
                "Worker queue full, {} watches deferred to the next tick",
                summary.rejected
            );
        }
        debug!(
            "Tick: {} due, {} submitted, {} already queued",
            summary.due, summary.submitted, summary.already_queued
        );

        Ok(summary)
    }

    /// Tick forever; store failures skip the tick
    pub async fn run(self) {
        info!(
            "Starting watch scheduler: tick every {:?}, re-check after {:?}",
            self.tick_interval, self.max_check_age
        );

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.tick().await {
                warn!("Skipping tick, could not read stale watches: {}", e);
            }
        }
    }
}
