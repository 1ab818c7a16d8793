//! Evaluation of a single watch

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::database::{WatchRecord, WatchStore};
use crate::errors::WatcherError;
use crate::health::{check_reference, evaluate};
use crate::probe::{NodeEndpoint, NodeProbe, ProbeCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationOutcome {
    /// Verdict or errors changed and `modified` moved
    Changed,
    /// Only `checked` moved
    Unchanged,
    /// The watch was deleted before its result could be stored
    Removed,
}

/// Probes a watched node against the reference node and persists the verdict
pub struct WatchEvaluator {
    store: Arc<dyn WatchStore>,
    probe: Arc<NodeProbe>,
    cache: Arc<ProbeCache>,
    reference: NodeEndpoint,
    reference_ttl: Duration,
    target_ttl: Duration,
}

impl WatchEvaluator {
    pub fn new(
        store: Arc<dyn WatchStore>,
        probe: Arc<NodeProbe>,
        cache: Arc<ProbeCache>,
        reference: NodeEndpoint,
        reference_ttl: Duration,
        target_ttl: Duration,
    ) -> Self {
        Self {
            store,
            probe,
            cache,
            reference,
            reference_ttl,
            target_ttl,
        }
    }

    pub fn from_config(
        store: Arc<dyn WatchStore>,
        probe: Arc<NodeProbe>,
        cache: Arc<ProbeCache>,
        config: &Config,
    ) -> Self {
        Self::new(
            store,
            probe,
            cache,
            config.reference.endpoint(),
            config.reference_refresh(),
            config.probe_cache_ttl(),
        )
    }

    /// Evaluate one watch and store the result
    ///
    /// Nothing is written when the reference node is unavailable or the
    /// target probe fails; the watch stays stale and is retried.
    #[instrument(skip(self, record), fields(watch = %record.key()))]
    pub async fn evaluate(&self, record: WatchRecord) -> Result<EvaluationOutcome, WatcherError> {
        let reference = self
            .cache
            .get_or_probe(&self.probe, &self.reference, self.reference_ttl)
            .await;
        let reference_chain_id = check_reference(&reference)?;
        debug!("Reference chain id {}", reference_chain_id);

        // Status fields may have moved since the tick read the record.
        let Some(mut current) = self.store.find(record.subscriber_id, &record.host).await? else {
            debug!("Watch {} was removed, skipping", record.key());
            return Ok(EvaluationOutcome::Removed);
        };

        let target = self
            .cache
            .get_or_probe(&self.probe, &current.endpoint(), self.target_ttl)
            .await;
        if let Some(e) = target.error {
            return Err(WatcherError::Probe(e));
        }

        let assessment = evaluate(&target, &reference);
        let changed = current.apply_assessment(&assessment, Utc::now());
        if !self.store.update_status(&current).await? {
            debug!("Watch {} was removed during the probe, dropping result", current.key());
            return Ok(EvaluationOutcome::Removed);
        }

        info!(
            "Node status: {} - {} - {} errors",
            current.host,
            if assessment.is_healthy { "OK" } else { "Alarming" },
            assessment.errors.len()
        );

        Ok(if changed {
            EvaluationOutcome::Changed
        } else {
            EvaluationOutcome::Unchanged
        })
    }
}
