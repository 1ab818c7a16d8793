use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use super::records::WatchRecord;
use crate::errors::StoreError;

/// Storage of watch records
///
/// Implementations are shared across the scheduler, the worker tasks, the
/// alert dispatcher and the web API, so every call is independent.
#[async_trait]
pub trait WatchStore: Send + Sync {
    /// Records whose last check is older than `max_age`, oldest first
    async fn query_by_staleness(&self, max_age: Duration) -> Result<Vec<WatchRecord>, StoreError>;

    /// Unhealthy records that changed since their last alert
    async fn query_alarmable(&self) -> Result<Vec<WatchRecord>, StoreError>;

    async fn query_by_subscriber(&self, subscriber_id: i64)
        -> Result<Vec<WatchRecord>, StoreError>;

    async fn find(&self, subscriber_id: i64, host: &str)
        -> Result<Option<WatchRecord>, StoreError>;

    /// Insert or replace a record
    ///
    /// Creating a record beyond the subscriber's cap fails with
    /// `StoreError::QuotaExceeded`; updating an existing one never does.
    async fn upsert(&self, record: &WatchRecord) -> Result<(), StoreError>;

    /// Write the evaluation fields of an existing record
    ///
    /// Only `verdict`, `errors`, `modified` and `checked` are written; the
    /// ports and `alarm_sent` keep their stored values. Never inserts, and
    /// returns whether the record still existed.
    async fn update_status(&self, record: &WatchRecord) -> Result<bool, StoreError>;

    /// Remove a record, returning whether it existed
    async fn delete(&self, subscriber_id: i64, host: &str) -> Result<bool, StoreError>;

    /// Set only `alarm_sent`, if the status is still the one last changed
    /// at `modified`
    ///
    /// Returns `false` when the record is gone or changed again since, so a
    /// newer status stays alarmable.
    async fn mark_alarm_sent(
        &self,
        subscriber_id: i64,
        host: &str,
        modified: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}
