//! Periodic alerting of subscribers about unhealthy nodes
//!
//! Each run reads the alarmable watches, sends one aggregated message per
//! subscriber and marks the notified watches. A failed notification leaves
//! its watches unmarked so they are sent again on the next run, and a watch
//! whose status changes while its alert is in flight is only marked for the
//! status that was sent. Delivery is at-least-once.

use anyhow::{anyhow, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, instrument, warn};

use super::notifier::Notifier;
use crate::constants::alerts;
use crate::database::{WatchRecord, WatchStore};
use crate::errors::StoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub subscribers_notified: usize,
    pub records_marked: usize,
    pub failed_subscribers: usize,
}

pub struct AlertDispatcher {
    store: Arc<dyn WatchStore>,
    notifier: Arc<dyn Notifier>,
    /// Serializes runs so an overrunning dispatch is never doubled
    running: Mutex<()>,
}

/// Group records by subscriber, in subscriber order
pub fn group_by_subscriber(records: Vec<WatchRecord>) -> BTreeMap<i64, Vec<WatchRecord>> {
    let mut groups: BTreeMap<i64, Vec<WatchRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.subscriber_id).or_default().push(record);
    }
    groups
}

/// Alert text for one subscriber: header line, then every record's lines
pub fn render_alert(records: &[WatchRecord]) -> String {
    let mut lines = vec![alerts::MESSAGE_HEADER.to_string()];
    lines.extend(records.iter().map(|record| record.to_string()));
    lines.join("\n")
}

impl AlertDispatcher {
    pub fn new(store: Arc<dyn WatchStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            running: Mutex::new(()),
        }
    }

    /// Notify every subscriber with alarmable watches once
    #[instrument(skip(self))]
    pub async fn dispatch_once(&self) -> Result<DispatchSummary, StoreError> {
        let _running = self.running.lock().await;

        let alarmable = self.store.query_alarmable().await?;
        if alarmable.is_empty() {
            debug!("No alarms to send");
            return Ok(DispatchSummary::default());
        }

        let mut summary = DispatchSummary::default();
        for (subscriber_id, records) in group_by_subscriber(alarmable) {
            let text = render_alert(&records);

            if let Err(e) = self.notifier.notify(subscriber_id, &text).await {
                warn!(
                    "Failed to alert subscriber {}, retrying next run: {}",
                    subscriber_id, e
                );
                summary.failed_subscribers += 1;
                continue;
            }
            summary.subscribers_notified += 1;

            let sent_at = Utc::now();
            for record in &records {
                let marked = self
                    .store
                    .mark_alarm_sent(record.subscriber_id, &record.host, record.modified, sent_at)
                    .await?;
                if marked {
                    summary.records_marked += 1;
                } else {
                    debug!("{} changed while alerting, left alarmable", record.key());
                }
            }
        }

        info!(
            "Alerted {} subscribers about {} nodes ({} failed)",
            summary.subscribers_notified, summary.records_marked, summary.failed_subscribers
        );
        Ok(summary)
    }

    /// Run shortly after start, then every `interval`
    pub async fn start(self: Arc<Self>, interval: Duration) -> Result<JobScheduler> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create JobScheduler: {}", e))?;

        let first_run = self.clone();
        let warmup = Job::new_one_shot_async(
            Duration::from_secs(alerts::FIRST_RUN_DELAY_SECONDS),
            move |_uuid, _scheduler| {
                let dispatcher = first_run.clone();
                Box::pin(async move { dispatcher.run_logged().await })
            },
        )
        .map_err(|e| anyhow!("Failed to create first alert job: {}", e))?;

        let repeated = self.clone();
        let periodic = Job::new_repeated_async(interval, move |_uuid, _scheduler| {
            let dispatcher = repeated.clone();
            Box::pin(async move { dispatcher.run_logged().await })
        })
        .map_err(|e| anyhow!("Failed to create alert job: {}", e))?;

        scheduler
            .add(warmup)
            .await
            .map_err(|e| anyhow!("Failed to add first alert job: {}", e))?;
        scheduler
            .add(periodic)
            .await
            .map_err(|e| anyhow!("Failed to add alert job: {}", e))?;
        scheduler
            .start()
            .await
            .map_err(|e| anyhow!("Failed to start alert scheduler: {}", e))?;

        info!("Alert dispatcher scheduled every {:?}", interval);
        Ok(scheduler)
    }

    async fn run_logged(&self) {
        if let Err(e) = self.dispatch_once().await {
            error!("Alert dispatch failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthAssessment;

    fn unhealthy(subscriber_id: i64, host: &str, errors: &[&str]) -> WatchRecord {
        let mut record = WatchRecord::new(subscriber_id, host);
        record.apply_assessment(
            &HealthAssessment::from_errors(errors.iter().map(|e| e.to_string()).collect()),
            Utc::now(),
        );
        record
    }

    #[test]
    fn groups_are_ordered_by_subscriber() {
        let groups = group_by_subscriber(vec![
            unhealthy(2, "b", &["Not synced"]),
            unhealthy(1, "a", &["Not synced"]),
            unhealthy(2, "c", &["Not synced"]),
        ]);

        let subscribers: Vec<i64> = groups.keys().copied().collect();
        assert_eq!(subscribers, vec![1, 2]);
        assert_eq!(groups[&2].len(), 2);
    }

    #[test]
    fn alert_text_starts_with_header() {
        let text = render_alert(&[
            unhealthy(1, "10.0.0.1", &["Seed port is closed"]),
            unhealthy(1, "10.0.0.2", &["API port is closed", "Not synced"]),
        ]);

        assert_eq!(
            text,
            "❗Node alert❗\n\
             ❗10.0.0.1 - Seed port is closed\n\
             ❗10.0.0.2 - API port is closed\n\
             ❗10.0.0.2 - Not synced"
        );
    }
}
